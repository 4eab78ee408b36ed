pub mod intersector;
pub mod passes;
pub mod projector;
pub mod renderer;
pub mod shading;
