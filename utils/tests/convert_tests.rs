use tch::{Device, Kind};
use utils::env::{convert_frame, Frame};
use utils::Error;

fn frame_filled(value: u8, channels: usize) -> Frame {
    Frame::new(vec![value; 7 * 7 * channels], 7, 7, channels)
}

#[test]
fn converted_tensor_has_model_shape_and_kind() {
    let frame = frame_filled(3, 12);
    let tensor = convert_frame(&frame, Device::Cpu).unwrap();

    assert_eq!(tensor.size(), vec![1, 4, 3, 7, 7]);
    assert_eq!(tensor.kind(), Kind::Uint8);
    assert_eq!(tensor.device(), Device::Cpu);
}

#[test]
fn values_scale_by_28_and_follow_the_permute() {
    let mut data = vec![0_u8; 7 * 7 * 6];
    // mark (h, w, c) = (2, 5, 4)
    data[(2 * 7 + 5) * 6 + 4] = 9;
    let frame = Frame::new(data, 7, 7, 6);

    let tensor = convert_frame(&frame, Device::Cpu).unwrap();

    // channel 4 is history slot 1, rgb slot 1; spatial axes are swapped.
    assert_eq!(tensor.int64_value(&[0, 1, 1, 5, 2]), 9 * 28);
    assert_eq!(tensor.sum(Kind::Int64).int64_value(&[]), 9 * 28);
}

#[test]
fn the_largest_symbol_maps_to_252() {
    let frame = frame_filled(9, 3);
    let tensor = convert_frame(&frame, Device::Cpu).unwrap();

    assert_eq!(tensor.max().int64_value(&[]), 252);
    assert_eq!(tensor.min().int64_value(&[]), 252);
}

#[test]
fn conversion_is_deterministic() {
    let mut data = Vec::with_capacity(7 * 7 * 6);
    for i in 0..7 * 7 * 6 {
        data.push((i % 10) as u8);
    }
    let frame = Frame::new(data, 7, 7, 6);

    let first = convert_frame(&frame, Device::Cpu).unwrap();
    let second = convert_frame(&frame, Device::Cpu).unwrap();

    assert!(first.equal(&second));
}

#[test]
fn wrong_spatial_size_is_rejected() {
    let frame = Frame::new(vec![0; 8 * 8 * 3], 8, 8, 3);
    let err = convert_frame(&frame, Device::Cpu).unwrap_err();

    assert!(matches!(err, Error::ShapeMismatch { found: [8, 8, 3] }));
}

#[test]
fn channel_count_must_be_a_multiple_of_three() {
    let frame = Frame::new(vec![0; 7 * 7 * 4], 7, 7, 4);

    assert!(matches!(
        convert_frame(&frame, Device::Cpu),
        Err(Error::ShapeMismatch { found: [7, 7, 4] })
    ));
}
