/// Reduction applied by [`all_reduce`](crate::DistributedInterface::all_reduce).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(strum::Display, strum::EnumString, strum::EnumIter, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Reduction {
    Sum,
    Prod,
    Min,
    Max,
}
