use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use visverify::{find, find_all, BoundingBox, ConfidenceScale, Image, MatchConfig, Matcher};

fn random_gray(rng: &mut StdRng, width: usize, height: usize) -> Image {
    let mut data = vec![0u8; width * height];
    for value in data.iter_mut() {
        *value = rng.random_range(0..=255);
    }
    Image::new(data, width, height, 1).unwrap()
}

fn random_rgb(rng: &mut StdRng, width: usize, height: usize) -> Image {
    let mut data = vec![0u8; width * height * 3];
    for value in data.iter_mut() {
        *value = rng.random_range(0..=255);
    }
    Image::new(data, width, height, 3).unwrap()
}

#[test]
fn cropped_needle_is_found_at_its_offset() {
    let mut rng = StdRng::seed_from_u64(123);
    let haystack = random_rgb(&mut rng, 64, 48);

    for _ in 0..5 {
        let x0 = rng.random_range(0..50);
        let y0 = rng.random_range(0..36);
        let region = BoundingBox::new(x0, y0, 14, 12);
        let needle = haystack.crop(&region).unwrap();

        let found = find(&haystack, &needle, 0.8).unwrap().unwrap();
        assert_eq!(found.bbox, region);
        assert_eq!(found.scale, ConfidenceScale::Unit);
        assert!(found.confidence > 0.999);
        assert_eq!(found.center(), region.center());
    }
}

#[test]
fn absent_needle_is_none() {
    let mut rng = StdRng::seed_from_u64(5);
    let haystack = random_gray(&mut rng, 40, 40);
    let needle = random_gray(&mut rng, 12, 12);
    assert_eq!(find(&haystack, &needle, 0.9).unwrap(), None);
}

#[test]
fn matcher_is_reusable_across_haystacks() {
    let mut rng = StdRng::seed_from_u64(99);
    let needle = random_gray(&mut rng, 8, 8);
    let matcher = Matcher::new(&needle).with_config(MatchConfig {
        confidence_threshold: 0.95,
        ..MatchConfig::default()
    });

    for &(x0, y0) in &[(0usize, 0usize), (20, 3), (24, 24)] {
        let mut canvas = random_gray(&mut rng, 32, 32).into_raw();
        for y in 0..8 {
            for x in 0..8 {
                canvas[(y0 + y) * 32 + x0 + x] = needle.pixel(x, y).unwrap()[0];
            }
        }
        let haystack = Image::new(canvas, 32, 32, 1).unwrap();
        let found = matcher.find(&haystack).unwrap().unwrap();
        assert_eq!((found.bbox.x, found.bbox.y), (x0 as i32, y0 as i32));
    }
}

#[test]
fn find_all_reports_each_copy_once() {
    let mut rng = StdRng::seed_from_u64(2024);
    let needle = random_gray(&mut rng, 6, 6);
    let mut canvas = vec![128u8; 48 * 24];
    for &(x0, y0) in &[(4usize, 4usize), (30, 2), (18, 15)] {
        for y in 0..6 {
            for x in 0..6 {
                canvas[(y0 + y) * 48 + x0 + x] = needle.pixel(x, y).unwrap()[0];
            }
        }
    }
    let haystack = Image::new(canvas, 48, 24, 1).unwrap();

    let all = find_all(&haystack, &needle, 0.95, 10).unwrap();
    let mut origins: Vec<_> = all.iter().map(|m| (m.bbox.x, m.bbox.y)).collect();
    origins.sort();
    assert_eq!(origins, vec![(4, 4), (18, 15), (30, 2)]);

    let capped = find_all(&haystack, &needle, 0.95, 2).unwrap();
    assert_eq!(capped.len(), 2);
}

fn square_scene(color: [u8; 3]) -> Image {
    let mut data = Vec::with_capacity(20 * 20 * 3);
    for y in 0..20 {
        for x in 0..20 {
            let inside = (6..14).contains(&x) && (6..14).contains(&y);
            data.extend_from_slice(if inside { &color } else { &[255, 255, 255] });
        }
    }
    Image::new(data, 20, 20, 3).unwrap()
}

#[test]
fn color_change_with_same_shape_is_not_a_match() {
    let red = square_scene([255, 0, 0]);
    let green = square_scene([0, 255, 0]);
    let region = BoundingBox::new(2, 2, 16, 16);

    let same = find(&red, &red.crop(&region).unwrap(), 0.8).unwrap().unwrap();
    assert_eq!(same.bbox, region);
    assert!(same.confidence > 0.999);

    assert_eq!(find(&red, &green.crop(&region).unwrap(), 0.8).unwrap(), None);
}

#[test]
fn color_needle_still_matches_gray_haystack() {
    let red = square_scene([255, 0, 0]);
    let region = BoundingBox::new(2, 2, 16, 16);
    let found = find(&red.to_gray(), &red.crop(&region).unwrap(), 0.9).unwrap().unwrap();
    assert_eq!(found.bbox, region);
}
