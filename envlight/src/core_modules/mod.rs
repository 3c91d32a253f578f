pub mod emitter;
pub mod image_loader;
pub mod light;
pub mod light_builder;
pub mod light_merger;
pub mod partitioner;
pub mod pixel;
pub mod projection;
pub mod region;
pub mod summed_area_table;
