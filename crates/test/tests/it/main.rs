mod actors;
mod cluster;
mod consensus;
mod safety;
