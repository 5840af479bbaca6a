mod collectives;
