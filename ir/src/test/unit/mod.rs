mod constructors;
mod decomposition;
mod shape;
