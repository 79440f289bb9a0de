/// What a camera reports once opened.
///
/// `fps` is 0 when the source does not advertise a rate (e.g. still images).
#[derive(Clone, Debug, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub source: String,
}
