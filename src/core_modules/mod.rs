pub mod alarm;
pub mod background;
pub mod frame;
pub mod mask;
pub mod motion_detector;
pub mod region;
pub mod smoothing;
