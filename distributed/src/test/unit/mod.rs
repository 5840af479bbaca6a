mod config;
mod datatype;
mod local;
