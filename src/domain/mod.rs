// Domain layer: core models and ports. No database or CLI types leak in here.

pub mod model;
pub mod ports;
