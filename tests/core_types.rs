use visverify::{
    distance, drag_sequence, interpolate_path, is_in_viewport, offset_point, relative_position,
    BoundingBox, Image, ImageFormat, Point, PointerAction, VisionError,
};

#[test]
fn image_rejects_invalid_shapes() {
    let err = Image::new(vec![0u8; 4], 0, 1, 1).err().unwrap();
    assert_eq!(
        err,
        VisionError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );

    let err = Image::new(vec![0u8; 11], 2, 2, 3).err().unwrap();
    assert_eq!(err, VisionError::BufferTooSmall { needed: 12, got: 11 });

    let err = Image::new(vec![0u8; 8], 2, 2, 2).err().unwrap();
    assert!(matches!(err, VisionError::InvalidArgument { .. }));
}

#[test]
fn conversions_keep_dimensions() {
    let rgb = Image::filled(5, 3, &[255, 0, 0]).unwrap();
    assert_eq!(rgb.format(), ImageFormat::Raw);

    let gray = rgb.to_gray();
    assert_eq!((gray.width(), gray.height(), gray.channels()), (5, 3, 1));
    assert_eq!(gray.pixel(4, 2), Some(&[76u8][..]));

    let rgba = gray.to_rgba();
    assert_eq!(rgba.channels(), 4);
    assert_eq!(rgba.pixel(0, 0), Some(&[76u8, 76, 76, 255][..]));
    assert_eq!(rgba.to_rgb().pixel(1, 1), Some(&[76u8, 76, 76][..]));
}

#[test]
fn crop_checks_bounds() {
    let data: Vec<u8> = (0..16).collect();
    let img = Image::new(data, 4, 4, 1).unwrap();

    let crop = img.crop(&BoundingBox::new(1, 2, 2, 2)).unwrap();
    assert_eq!(crop.data(), &[9, 10, 13, 14]);

    let err = img.crop(&BoundingBox::new(3, 0, 2, 1)).unwrap_err();
    assert_eq!(
        err,
        VisionError::RoiOutOfBounds {
            x: 3,
            y: 0,
            width: 2,
            height: 1,
            img_width: 4,
            img_height: 4,
        }
    );
    assert!(img.crop(&BoundingBox::new(-1, 0, 1, 1)).is_err());
}

#[test]
fn distance_and_center() {
    assert_eq!(distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 5.0);
    let bbox = BoundingBox::new(10, 20, 5, 5);
    assert_eq!(bbox.center(), Point::new(12.5, 22.5));
    assert_eq!(offset_point(&bbox, -2.5, 7.5), Point::new(10.0, 30.0));
}

#[test]
fn viewport_edges_are_inclusive() {
    assert!(is_in_viewport(&BoundingBox::new(0, 0, 100, 50), 100, 50));
    assert!(!is_in_viewport(&BoundingBox::new(1, 0, 100, 50), 100, 50));
    assert!(!is_in_viewport(&BoundingBox::new(-1, 0, 10, 10), 100, 50));
    assert!(!is_in_viewport(&BoundingBox::new(0, 41, 10, 10), 100, 50));
}

#[test]
fn relative_position_uses_centers() {
    let a = BoundingBox::new(0, 0, 10, 10);
    let b = BoundingBox::new(20, 0, 10, 10);
    let rel = relative_position(&a, &b);
    assert_eq!((rel.offset_x, rel.offset_y), (-20.0, 0.0));
    assert!(rel.is_left && !rel.is_right);
    assert!(!rel.is_above && !rel.is_below);
}

#[test]
fn path_of_ten_steps_ends_at_target() {
    let path = interpolate_path(Point::new(0.0, 0.0), Point::new(100.0, 100.0), 10).unwrap();
    assert_eq!(path.len(), 10);
    assert!(distance(path[0], Point::new(10.0, 10.0)) < 1e-9);
    assert_eq!(path[9], Point::new(100.0, 100.0));

    let err = interpolate_path(Point::new(0.0, 0.0), Point::new(1.0, 1.0), 0).unwrap_err();
    assert!(matches!(err, VisionError::InvalidArgument { .. }));
}

#[test]
fn drag_presses_moves_and_releases() {
    let events = drag_sequence(Point::new(0.0, 0.0), Point::new(40.0, 0.0), 4).unwrap();
    let actions: Vec<_> = events.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            PointerAction::Move,
            PointerAction::Down,
            PointerAction::Move,
            PointerAction::Move,
            PointerAction::Move,
            PointerAction::Move,
            PointerAction::Up,
        ]
    );
    assert_eq!(events.last().unwrap().point, Point::new(40.0, 0.0));
}
