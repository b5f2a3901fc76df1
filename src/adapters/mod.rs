// Adapters layer: concrete collaborators behind the domain ports.
// The flow and checkpoint are the minimal model the CLI ships with; any other
// DensityModel plugs into the same tasks.

pub mod checkpoint;
pub mod flow;
pub mod loader;
