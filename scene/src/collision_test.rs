#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::test_helpers::*;
use crate::property::Property;

fn colliding(scene: &Scene, id: EntityId) -> bool {
    scene.get(&id).and_then(Entity::shape).is_some_and(|s| s.is_colliding)
}

// =============================================================
// overlaps
// =============================================================

#[test]
fn overlapping_boxes_collide() {
    let a = Aabb::new(0.0, 0.0, 100.0, 100.0);
    let b = Aabb::new(50.0, 50.0, 100.0, 100.0);
    assert!(overlaps(&a, &b));
}

#[test]
fn overlap_is_symmetric() {
    let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
    let b = Aabb::new(5.0, -3.0, 2.0, 20.0);
    assert_eq!(overlaps(&a, &b), overlaps(&b, &a));
    let c = Aabb::new(30.0, 30.0, 1.0, 1.0);
    assert_eq!(overlaps(&a, &c), overlaps(&c, &a));
}

#[test]
fn touching_edges_do_not_collide() {
    let a = Aabb::new(0.0, 0.0, 100.0, 100.0);
    let right = Aabb::new(100.0, 0.0, 50.0, 50.0);
    let above = Aabb::new(0.0, 100.0, 50.0, 50.0);
    assert!(!overlaps(&a, &right));
    assert!(!overlaps(&a, &above));
}

#[test]
fn zero_extent_box_never_collides() {
    let a = Aabb::new(0.0, 0.0, 100.0, 100.0);
    let flat = Aabb::new(50.0, 50.0, 0.0, 0.0);
    assert!(!overlaps(&a, &flat));
    assert!(!overlaps(&flat, &a));
}

#[test]
fn containment_counts_as_overlap() {
    let outer = Aabb::new(0.0, 0.0, 100.0, 100.0);
    let inner = Aabb::new(10.0, 10.0, 5.0, 5.0);
    assert!(overlaps(&outer, &inner));
}

// =============================================================
// Aabb helpers
// =============================================================

#[test]
fn contains_includes_edges() {
    let b = Aabb::new(10.0, 10.0, 20.0, 20.0);
    assert!(b.contains(Point::new(10.0, 10.0)));
    assert!(b.contains(Point::new(30.0, 30.0)));
    assert!(!b.contains(Point::new(30.1, 15.0)));
}

#[test]
fn union_covers_both() {
    let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
    let b = Aabb::new(20.0, 5.0, 10.0, 10.0);
    assert_eq!(a.union(&b), Aabb::new(0.0, 0.0, 30.0, 15.0));
}

#[test]
fn aabb_only_for_collidable_kinds() {
    assert!(aabb(&rect(0.0, 0.0, 1.0, 1.0)).is_some());
    assert_eq!(aabb(&circle(5.0, 6.0, 20.0)), Some(Aabb::new(5.0, 6.0, 20.0, 20.0)));
    assert!(aabb(&slider(0.0, 1.0, None, Property::X)).is_none());
    assert!(aabb(&receiver(None)).is_none());
    assert!(aabb(&group(&[])).is_none());
}

// =============================================================
// detect_all
// =============================================================

#[test]
fn dragged_rect_overlapping_marks_both() {
    let mut scene = Scene::new();
    let a = add(&mut scene, rect(0.0, 0.0, 100.0, 100.0));
    let b = add(&mut scene, rect(50.0, 50.0, 100.0, 100.0));
    let hits = detect_all(&mut scene);
    assert!(hits.contains(&a) && hits.contains(&b));
    assert!(colliding(&scene, a));
    assert!(colliding(&scene, b));
}

#[test]
fn non_reactive_side_stays_clear() {
    let mut scene = Scene::new();
    let a = add(&mut scene, rect(0.0, 0.0, 100.0, 100.0));
    let b = add(&mut scene, inert(rect(50.0, 50.0, 100.0, 100.0)));
    detect_all(&mut scene);
    assert!(colliding(&scene, a));
    assert!(!colliding(&scene, b));
}

#[test]
fn flags_reset_when_apart() {
    let mut scene = Scene::new();
    let a = add(&mut scene, rect(0.0, 0.0, 100.0, 100.0));
    let b = add(&mut scene, rect(50.0, 50.0, 100.0, 100.0));
    detect_all(&mut scene);
    scene.get_mut(&b).unwrap().x = 500.0;
    let hits = detect_all(&mut scene);
    assert!(hits.is_empty());
    assert!(!colliding(&scene, a));
    assert!(!colliding(&scene, b));
}

#[test]
fn sliders_and_receivers_are_ignored() {
    let mut scene = Scene::new();
    let r = add(&mut scene, rect(0.0, 0.0, 300.0, 300.0));
    add(&mut scene, slider(0.0, 1.0, None, Property::X));
    add(&mut scene, receiver(None));
    let hits = detect_all(&mut scene);
    assert!(hits.is_empty());
    assert!(!colliding(&scene, r));
}

#[test]
fn circle_collides_as_bounding_square() {
    let mut scene = Scene::new();
    let c = add(&mut scene, circle(0.0, 0.0, 100.0));
    // Corner of the square, outside the disc.
    let r = add(&mut scene, rect(90.0, 90.0, 20.0, 20.0));
    detect_all(&mut scene);
    assert!(colliding(&scene, c));
    assert!(colliding(&scene, r));
}

#[test]
fn conditional_takes_part() {
    let mut scene = Scene::new();
    let r = add(&mut scene, rect(0.0, 0.0, 100.0, 100.0));
    let c = add(
        &mut scene,
        conditional(10.0, 10.0, None, Property::X, "==", crate::property::Scalar::Number(0.0), crate::rules::Transform::default()),
    );
    detect_all(&mut scene);
    assert!(colliding(&scene, r));
    assert!(colliding(&scene, c));
}

// =============================================================
// blocking_obstacles
// =============================================================

#[test]
fn obstacle_in_path_blocks() {
    let mut scene = Scene::new();
    let me = add(&mut scene, rect(0.0, 0.0, 50.0, 50.0));
    let wall = add(&mut scene, obstacle(100.0, 0.0, 20.0, 200.0));
    let candidate = Aabb::new(80.0, 0.0, 50.0, 50.0);
    assert_eq!(blocking_obstacles(&scene, me, &candidate), vec![wall]);
}

#[test]
fn non_obstacles_never_block() {
    let mut scene = Scene::new();
    let me = add(&mut scene, rect(0.0, 0.0, 50.0, 50.0));
    add(&mut scene, rect(100.0, 0.0, 20.0, 200.0));
    let candidate = Aabb::new(80.0, 0.0, 50.0, 50.0);
    assert!(blocking_obstacles(&scene, me, &candidate).is_empty());
}

#[test]
fn obstacle_ignores_itself() {
    let mut scene = Scene::new();
    let me = add(&mut scene, obstacle(0.0, 0.0, 50.0, 50.0));
    let candidate = Aabb::new(10.0, 0.0, 50.0, 50.0);
    assert!(blocking_obstacles(&scene, me, &candidate).is_empty());
}

// =============================================================
// hit_test
// =============================================================

#[test]
fn hit_test_empty_scene() {
    let scene = Scene::new();
    assert!(hit_test(&scene, Point::new(0.0, 0.0)).is_none());
}

#[test]
fn hit_test_prefers_topmost() {
    let mut scene = Scene::new();
    let mut low = rect(0.0, 0.0, 100.0, 100.0);
    low.render_order = 1;
    let mut high = rect(50.0, 50.0, 100.0, 100.0);
    high.render_order = 2;
    let low_id = add(&mut scene, low);
    let high_id = add(&mut scene, high);
    assert_eq!(hit_test(&scene, Point::new(75.0, 75.0)), Some(high_id));
    assert_eq!(hit_test(&scene, Point::new(10.0, 10.0)), Some(low_id));
    assert!(hit_test(&scene, Point::new(500.0, 500.0)).is_none());
}

#[test]
fn hit_test_reaches_sliders_not_groups() {
    let mut scene = Scene::new();
    let s = add(&mut scene, slider(0.0, 1.0, None, Property::X));
    add(&mut scene, group(&[s]));
    assert_eq!(hit_test(&scene, Point::new(100.0, 20.0)), Some(s));
}
