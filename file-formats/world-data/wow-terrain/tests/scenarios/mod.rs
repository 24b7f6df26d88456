mod terrain_chunk;
