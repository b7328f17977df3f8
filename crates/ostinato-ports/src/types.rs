use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub type Ms = f64; // musical time in milliseconds, 0 at the region start

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Velocity01(pub f32);

impl Velocity01 {
    pub fn new(value: f32) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

pub type Shared<T> = Arc<T>;
