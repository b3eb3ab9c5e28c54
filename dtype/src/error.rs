use snafu::Snafu;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// More dimensions than a [`Dims`](crate::Dims) can hold inline.
    #[snafu(display("too many dims: {len} exceeds capacity {max}"))]
    TooManyDims { len: usize, max: usize },

    #[snafu(display("negative dim {value} at axis {axis}"))]
    NegativeDim { axis: usize, value: i64 },

    #[snafu(display("unknown device: {device}"))]
    UnknownDevice { device: String },
}
