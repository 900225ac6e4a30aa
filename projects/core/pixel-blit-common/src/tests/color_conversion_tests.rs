use crate::color_565::{expand_565_row_to_8888, Color565, Shifts8888};
use crate::color_8888::Color8888;
use rstest::rstest;

#[test]
fn can_convert_color_8888_to_565() {
    let red = Color8888::new(255, 0, 0, 255).to_color_565();
    let green = Color8888::new(0, 255, 0, 255).to_color_565();
    let blue = Color8888::new(0, 0, 255, 255).to_color_565();

    // Full intensity survives truncation because expansion replicates the top bits
    assert_eq!((red.red(), red.green(), red.blue()), (255, 0, 0));
    assert_eq!((green.red(), green.green(), green.blue()), (0, 255, 0));
    assert_eq!((blue.red(), blue.green(), blue.blue()), (0, 0, 255));
}

#[rstest]
#[case(0x0000, Color8888::new(0, 0, 0, 255))]
#[case(0xFFFF, Color8888::new(255, 255, 255, 255))]
#[case(0xF800, Color8888::new(255, 0, 0, 255))]
#[case(0x07E0, Color8888::new(0, 255, 0, 255))]
#[case(0x001F, Color8888::new(0, 0, 255, 255))]
// 5-bit 0b10000 -> 0b10000100, 6-bit 0b100000 -> 0b10000010
#[case(0x8410, Color8888::new(132, 130, 132, 255))]
fn can_convert_color_565_to_8888(#[case] raw: u16, #[case] expected: Color8888) {
    assert_eq!(Color565::from_raw(raw).to_color_8888(), expected);
}

#[test]
fn to_color_8888_with_alpha_keeps_alpha() {
    let color = Color565::from_rgb(0, 0, 255).to_color_8888_with_alpha(17);
    assert_eq!(color, Color8888::new(0, 0, 255, 17));
}

#[test]
fn distance_squared_is_zero_for_equal_colours() {
    let color = Color8888::new(1, 2, 3, 4);
    assert_eq!(color.distance_squared(&color), 0);
    assert_eq!(
        Color8888::new(0, 0, 0, 0).distance_squared(&Color8888::new(255, 255, 255, 255)),
        4 * 255 * 255
    );
}

#[rstest]
#[case(Color8888::OPAQUE_WHITE, Color8888::new(128, 64, 255, 0), Color8888::new(128, 64, 255, 0))]
#[case(Color8888::new(200, 100, 50, 255), Color8888::OPAQUE_WHITE, Color8888::new(200, 100, 50, 255))]
#[case(Color8888::new(255, 255, 255, 255), Color8888::new(127, 127, 127, 127), Color8888::new(127, 127, 127, 127))]
#[case(Color8888::new(100, 100, 100, 100), Color8888::new(128, 128, 128, 128), Color8888::new(50, 50, 50, 50))]
fn modulate_scales_each_channel(
    #[case] color: Color8888,
    #[case] modulation: Color8888,
    #[case] expected: Color8888,
) {
    assert_eq!(color.modulate(modulation), expected);
}

#[rstest]
#[case(Shifts8888::ARGB, 0xFFFF0000, 0xFF00FF00)]
#[case(Shifts8888::ABGR, 0xFF0000FF, 0xFF00FF00)]
#[case(Shifts8888::XRGB, 0x00FF0000, 0x0000FF00)]
#[case(Shifts8888::XBGR, 0x000000FF, 0x0000FF00)]
fn expand_row_places_channels(
    #[case] shifts: Shifts8888,
    #[case] expected_red: u32,
    #[case] expected_green: u32,
) {
    let mut src = [0u8; 4];
    src[..2].copy_from_slice(&0xF800u16.to_ne_bytes());
    src[2..].copy_from_slice(&0x07E0u16.to_ne_bytes());
    let mut dst = [0u8; 8];

    expand_565_row_to_8888(&src, &mut dst, shifts, 0xFF);

    assert_eq!(u32::from_ne_bytes([dst[0], dst[1], dst[2], dst[3]]), expected_red);
    assert_eq!(u32::from_ne_bytes([dst[4], dst[5], dst[6], dst[7]]), expected_green);
}

#[test]
fn expand_row_stops_at_shorter_buffer() {
    let src = [0xFFu8; 6];
    let mut dst = [0u8; 8];
    expand_565_row_to_8888(&src, &mut dst, Shifts8888::ARGB, 0x80);
    assert_eq!(u32::from_ne_bytes([dst[4], dst[5], dst[6], dst[7]]), 0x80FFFFFF);
}
