/// A `start --> end` line, borrowed from the input. `trailing` is whatever
/// followed the second timestamp, line terminator excluded.
#[derive(Debug, PartialEq, Eq)]
pub struct TimingLine<'a> {
    pub(crate) start: &'a str,
    pub(crate) end: &'a str,
    pub(crate) trailing: &'a str,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Line<'a> {
    Timing(TimingLine<'a>),
    Opaque(&'a str),
}
