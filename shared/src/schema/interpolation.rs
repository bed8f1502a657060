use crate::schema::attribute::AttributeValue;

/// One snapshot of a single attribute, as seen by an interpolation function
#[derive(Copy, Clone, Debug)]
pub struct InterpolationPoint<'a> {
    pub time: f64,
    pub data: &'a [u8],
}

/// Computes an attribute's value at `target_time` from time-ordered points.
/// At least one point is always provided and `output` has the attribute's size.
pub type InterpolationFn = fn(points: &[InterpolationPoint<'_>], target_time: f64, output: &mut [u8]);

/// Values that can be blended linearly
pub trait Lerp: AttributeValue {
    fn lerp(from: Self, to: Self, fraction: f64) -> Self;
}

impl Lerp for f32 {
    fn lerp(from: Self, to: Self, fraction: f64) -> Self {
        from + (to - from) * fraction as f32
    }
}

impl Lerp for f64 {
    fn lerp(from: Self, to: Self, fraction: f64) -> Self {
        from + (to - from) * fraction
    }
}

macro_rules! impl_lerp_integer {
    ($($integer_type:ty),*) => {
        $(
            impl Lerp for $integer_type {
                fn lerp(from: Self, to: Self, fraction: f64) -> Self {
                    let from = from as f64;
                    let to = to as f64;
                    (from + (to - from) * fraction).round() as $integer_type
                }
            }
        )*
    };
}

impl_lerp_integer!(u8, u16, u32, u64, i8, i16, i32, i64);

/// Linear interpolation (and extrapolation past the newest point) between the
/// two points bracketing the target time
pub fn linear<T: Lerp>(points: &[InterpolationPoint<'_>], target_time: f64, output: &mut [u8]) {
    let Some(last) = points.last() else {
        return;
    };
    if points.len() == 1 {
        output.copy_from_slice(last.data);
        return;
    }

    let mut left = points.len() - 2;
    let mut right = points.len() - 1;
    while left > 0 && points[left].time > target_time {
        right = left;
        left -= 1;
    }

    let from = T::read_from(points[left].data);
    let span = points[right].time - points[left].time;
    if span <= 0.0 {
        from.write_to(output);
        return;
    }
    let to = T::read_from(points[right].data);
    let fraction = (target_time - points[left].time) / span;

    T::lerp(from, to, fraction).write_to(output);
}
