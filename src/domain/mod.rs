// Domain layer: evaluation records and the ports to the model, the data and the filesystem.

pub mod model;
pub mod ports;
