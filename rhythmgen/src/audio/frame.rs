// One stereo frame. Buffers only hold these between panning and the next
// canonical coercion; everything else is mono.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StereoFrame {
    pub left: f32,
    pub right: f32,
}

impl StereoFrame {
    pub fn zero() -> Self { // just giving `default` a better name for clarity
        Self::default()
    }

    pub fn from_mono(x: f32) -> Self {
        Self { left: x, right: x }
    }

    pub fn to_mono(self) -> f32 {
        (self.left + self.right) * 0.5
    }

    pub fn peak(self) -> f32 {
        self.left.abs().max(self.right.abs())
    }
}
