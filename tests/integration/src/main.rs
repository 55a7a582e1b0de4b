mod helpers;

mod cli;
mod fixtures;
mod generate;
mod properties;
mod remap;
