/// Why a frame produced no pose.
///
/// Variants are ordered by pipeline stage; when every candidate fails, the
/// frame reports the furthest stage any candidate reached.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectError {
    #[error("no quadrilateral candidate in frame")]
    NoCandidate,
    #[error("candidate rejected by border validation")]
    BorderRejected,
    #[error("decoded pattern matches no orientation of the reference")]
    OrientationUnresolved,
    #[error("pose solve failed")]
    PoseSolveFailed,
}
