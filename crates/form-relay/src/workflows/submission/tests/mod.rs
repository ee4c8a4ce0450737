mod common;
mod pipeline;
mod privacy;
