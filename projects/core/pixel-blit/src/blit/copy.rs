use super::BlitInfo;

/// Copies rows verbatim. Source and destination share a pixel size.
pub(super) fn blit_copy(info: &mut BlitInfo<'_>) {
    info.for_each_row(|src, dst| dst.copy_from_slice(src));
}
