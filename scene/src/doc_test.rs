#![allow(clippy::float_cmp)]

use serde_json::json;

use super::test_helpers::*;
use super::*;

// =============================================================
// EntityKind serde
// =============================================================

#[test]
fn kind_serde_all_variants() {
    let cases = [
        (EntityKind::Rectangle, "\"rectangle\""),
        (EntityKind::Circle, "\"circle\""),
        (EntityKind::Slider, "\"slider\""),
        (EntityKind::Conditional, "\"conditional\""),
        (EntityKind::Group, "\"group\""),
        (EntityKind::ExternalReceiver, "\"external_receiver\""),
    ];
    for (kind, expected) in cases {
        assert_eq!(serde_json::to_string(&kind).unwrap(), expected);
        let back: EntityKind = serde_json::from_str(expected).unwrap();
        assert_eq!(back, kind);
    }
}

// =============================================================
// Entity accessors
// =============================================================

#[test]
fn kind_matches_body() {
    assert_eq!(rect(0.0, 0.0, 1.0, 1.0).kind(), EntityKind::Rectangle);
    assert_eq!(circle(0.0, 0.0, 1.0).kind(), EntityKind::Circle);
    assert_eq!(slider(0.0, 1.0, None, Property::X).kind(), EntityKind::Slider);
    assert_eq!(group(&[]).kind(), EntityKind::Group);
    assert_eq!(receiver(None).kind(), EntityKind::ExternalReceiver);
}

#[test]
fn circle_extent_is_diameter_square() {
    assert_eq!(circle(0.0, 0.0, 30.0).extent(), Some((30.0, 30.0)));
}

#[test]
fn receiver_extent_is_fixed() {
    assert_eq!(receiver(None).extent(), Some((RECEIVER_WIDTH, RECEIVER_HEIGHT)));
}

#[test]
fn group_has_no_extent() {
    assert_eq!(group(&[]).extent(), None);
}

#[test]
fn shape_only_for_collidable_kinds() {
    assert!(rect(0.0, 0.0, 1.0, 1.0).shape().is_some());
    assert!(circle(0.0, 0.0, 1.0).shape().is_some());
    assert!(slider(0.0, 1.0, None, Property::X).shape().is_none());
    assert!(group(&[]).shape().is_none());
    assert!(receiver(None).shape().is_none());
}

#[test]
fn new_shape_displays_base_color() {
    let e = rect(0.0, 0.0, 1.0, 1.0);
    assert_eq!(e.shape().unwrap().fill, BASE);
}

#[test]
fn slider_clamp_bounds_value() {
    let e = slider(10.0, 20.0, None, Property::X);
    let s = e.as_slider().unwrap();
    assert_eq!(s.clamp(5.0), 10.0);
    assert_eq!(s.clamp(25.0), 20.0);
    assert_eq!(s.clamp(15.0), 15.0);
}

// =============================================================
// Scene store
// =============================================================

#[test]
fn scene_insert_get_remove() {
    let mut scene = Scene::new();
    assert!(scene.is_empty());
    let id = add(&mut scene, rect(0.0, 0.0, 10.0, 10.0));
    assert_eq!(scene.len(), 1);
    assert!(scene.contains(&id));
    assert_eq!(scene.get(&id).unwrap().id, id);
    assert!(scene.remove(&id).is_some());
    assert!(scene.get(&id).is_none());
    assert!(scene.remove(&id).is_none());
}

#[test]
fn scene_insert_same_id_overwrites() {
    let mut scene = Scene::new();
    let mut e = rect(0.0, 0.0, 10.0, 10.0);
    let id = add(&mut scene, e.clone());
    e.x = 42.0;
    scene.insert(e);
    assert_eq!(scene.len(), 1);
    assert_eq!(scene.get(&id).unwrap().x, 42.0);
}

#[test]
fn resolve_none_and_dangling() {
    let scene = Scene::new();
    assert!(scene.resolve(None).is_none());
    assert!(scene.resolve(Some(Uuid::new_v4())).is_none());
}

#[test]
fn sorted_entities_by_render_order() {
    let mut scene = Scene::new();
    let mut top = rect(0.0, 0.0, 1.0, 1.0);
    top.render_order = 5;
    let mut bottom = rect(0.0, 0.0, 1.0, 1.0);
    bottom.render_order = -1;
    let top_id = add(&mut scene, top);
    let bottom_id = add(&mut scene, bottom);
    let mid_id = add(&mut scene, rect(0.0, 0.0, 1.0, 1.0));
    assert_eq!(scene.sorted_ids(), vec![bottom_id, mid_id, top_id]);
}

#[test]
fn ids_of_kind_filters() {
    let mut scene = Scene::new();
    add(&mut scene, rect(0.0, 0.0, 1.0, 1.0));
    let s = add(&mut scene, slider(0.0, 1.0, None, Property::X));
    assert_eq!(scene.ids_of_kind(EntityKind::Slider), vec![s]);
    assert!(scene.ids_of_kind(EntityKind::Group).is_empty());
}

#[test]
fn load_replaces_contents() {
    let mut scene = Scene::new();
    add(&mut scene, rect(0.0, 0.0, 1.0, 1.0));
    let keep = rect(5.0, 5.0, 1.0, 1.0);
    let keep_id = keep.id;
    scene.load(vec![keep]);
    assert_eq!(scene.len(), 1);
    assert!(scene.contains(&keep_id));
}

// =============================================================
// Wire format
// =============================================================

#[test]
fn rectangle_serializes_tagged_and_camel_case() {
    let e = rect(1.0, 2.0, 3.0, 4.0);
    let v = serde_json::to_value(&e).unwrap();
    assert_eq!(v["type"], "rectangle");
    assert_eq!(v["width"], 3.0);
    assert_eq!(v["reactsToCollision"], true);
    assert_eq!(v["appearance"]["onCollision"]["color"], HOT);
    assert!(v.get("isColliding").is_none());
    assert!(v.get("fill").is_none());
    assert!(v.get("groupId").is_none());
}

#[test]
fn rectangle_deserializes_with_defaults() {
    let id = Uuid::new_v4();
    let v = json!({
        "id": id,
        "type": "rectangle",
        "x": 10,
        "y": 20,
        "width": 100,
        "height": 50,
        "appearance": {
            "onCollision": { "color": "orange" },
            "onNoCollision": { "color": "purple" }
        }
    });
    let e: Entity = serde_json::from_value(v).unwrap();
    assert_eq!(e.id, id);
    assert_eq!(e.kind(), EntityKind::Rectangle);
    assert_eq!(e.x, 10.0);
    assert_eq!(e.render_order, 0);
    let style = e.shape().unwrap();
    assert!(style.reacts_to_collision);
    assert!(!style.is_obstacle);
    assert_eq!(style.pivot, Pivot::default());
    assert!(!style.is_colliding);
}

#[test]
fn slider_deserializes_references() {
    let parent = Uuid::new_v4();
    let target = Uuid::new_v4();
    let v = json!({
        "id": Uuid::new_v4(),
        "type": "slider",
        "x": 0, "y": 0, "width": 200, "height": 40,
        "targetId": target,
        "targetProperty": "rotation",
        "min": 0, "max": 360,
        "inheritedFromId": parent
    });
    let e: Entity = serde_json::from_value(v).unwrap();
    let s = e.as_slider().unwrap();
    assert_eq!(s.target_id, Some(target));
    assert_eq!(s.target_property, Property::Rotation);
    assert_eq!(s.inherited_from_id, Some(parent));
    assert_eq!(s.value, 0.0);
}

#[test]
fn receiver_defaults_baud_rate_and_skips_link() {
    let v = json!({ "id": Uuid::new_v4(), "type": "external_receiver", "x": 0, "y": 0 });
    let e: Entity = serde_json::from_value(v).unwrap();
    let r = e.as_receiver().unwrap();
    assert_eq!(r.baud_rate, DEFAULT_BAUD_RATE);
    assert_eq!(r.link.status, LinkStatus::Disconnected);
    let out = serde_json::to_value(&e).unwrap();
    assert!(out.get("link").is_none());
}

#[test]
fn unknown_type_is_rejected() {
    let v = json!({ "id": Uuid::new_v4(), "type": "hexagon", "x": 0, "y": 0 });
    assert!(serde_json::from_value::<Entity>(v).is_err());
}
