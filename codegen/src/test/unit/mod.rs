mod attribute;
mod text;
