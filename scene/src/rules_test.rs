#![allow(clippy::float_cmp)]

use serde_json::json;
use uuid::Uuid;

use super::*;
use crate::doc::test_helpers::*;

fn recolor(color: &str) -> Transform {
    Transform::Recolor { color: color.into() }
}

fn fill(scene: &Scene, id: EntityId) -> String {
    scene.get(&id).and_then(Entity::shape).map(|s| s.fill.clone()).unwrap_or_default()
}

fn transformed(scene: &Scene, id: EntityId) -> bool {
    scene.get(&id).and_then(Entity::as_conditional).is_some_and(|c| c.state.is_transformed)
}

// =============================================================
// Operator
// =============================================================

#[test]
fn operator_parse_and_display() {
    for raw in ["==", "!=", ">", "<", ">=", "<="] {
        let op = Operator::from(raw.to_string());
        assert!(!matches!(op, Operator::Unknown(_)));
        assert_eq!(op.to_string(), raw);
    }
    assert_eq!(Operator::from("~=".to_string()), Operator::Unknown("~=".into()));
}

#[test]
fn operator_serde_as_symbol() {
    assert_eq!(serde_json::to_string(&Operator::Ge).unwrap(), "\">=\"");
    let op: Operator = serde_json::from_str("\"<\"").unwrap();
    assert_eq!(op, Operator::Lt);
}

#[test]
fn numeric_comparisons() {
    let five = Scalar::Number(5.0);
    let three = Scalar::Number(3.0);
    assert!(Operator::Gt.evaluate(&five, &three));
    assert!(!Operator::Lt.evaluate(&five, &three));
    assert!(Operator::Ge.evaluate(&five, &five));
    assert!(Operator::Le.evaluate(&three, &five));
    assert!(Operator::Eq.evaluate(&five, &Scalar::Text("5".into())));
    assert!(Operator::Ne.evaluate(&five, &three));
}

#[test]
fn text_equality() {
    let red = Scalar::Text("red".into());
    assert!(Operator::Eq.evaluate(&red, &Scalar::Text("red".into())));
    assert!(Operator::Ne.evaluate(&red, &Scalar::Text("blue".into())));
}

#[test]
fn incomparable_only_satisfies_not_equal() {
    let n = Scalar::Number(1.0);
    let t = Scalar::Text("red".into());
    assert!(Operator::Ne.evaluate(&n, &t));
    for op in [Operator::Eq, Operator::Gt, Operator::Lt, Operator::Ge, Operator::Le] {
        assert!(!op.evaluate(&n, &t));
    }
}

#[test]
fn unknown_operator_is_false() {
    let op = Operator::Unknown("~".into());
    assert!(!op.evaluate(&Scalar::Number(1.0), &Scalar::Number(1.0)));
}

// =============================================================
// Wire format
// =============================================================

#[test]
fn conditional_payload_deserializes() {
    let watched = Uuid::new_v4();
    let v = json!({
        "id": Uuid::new_v4(),
        "type": "conditional",
        "x": 0, "y": 0, "width": 50, "height": 50,
        "appearance": {
            "onCollision": { "color": "red" },
            "onNoCollision": { "color": "gray" }
        },
        "watchedEntityId": watched,
        "watchedProperty": "is_colliding",
        "comparisonOperator": "==",
        "comparisonValue": true,
        "transform": { "kind": "reposition", "x": 10, "y": 20 }
    });
    let e: Entity = serde_json::from_value(v).unwrap();
    let rule = &e.as_conditional().unwrap().rule;
    assert_eq!(rule.watched_entity_id, Some(watched));
    assert_eq!(rule.watched_property, Property::IsColliding);
    assert_eq!(rule.comparison_operator, Operator::Eq);
    assert_eq!(rule.comparison_value, Scalar::Bool(true));
    assert_eq!(rule.transform, Transform::Reposition { x: 10.0, y: 20.0 });
}

#[test]
fn missing_transform_defaults_to_recolor() {
    let rule: Rule = serde_json::from_value(json!({})).unwrap();
    assert_eq!(rule.transform, Transform::default());
    assert_eq!(rule.comparison_operator, Operator::Eq);
}

// =============================================================
// predicate
// =============================================================

#[test]
fn predicate_unresolved_is_none() {
    let scene = Scene::new();
    let rule = Rule { watched_entity_id: Some(Uuid::new_v4()), ..Rule::default() };
    assert_eq!(predicate(&scene, &rule), None);
    assert_eq!(predicate(&scene, &Rule::default()), None);
}

#[test]
fn predicate_missing_property_is_false() {
    let mut scene = Scene::new();
    let r = add(&mut scene, rect(0.0, 0.0, 1.0, 1.0));
    let rule = Rule {
        watched_entity_id: Some(r),
        watched_property: Property::Diameter,
        comparison_operator: Operator::Ne,
        comparison_value: Scalar::Number(0.0),
        ..Rule::default()
    };
    assert_eq!(predicate(&scene, &rule), Some(false));
}

// =============================================================
// apply / revert
// =============================================================

#[test]
fn apply_is_idempotent() {
    let mut e = conditional(0.0, 0.0, None, Property::X, "==", Scalar::Number(0.0), recolor("gold"));
    assert!(apply(&mut e));
    assert!(!apply(&mut e));
    assert_eq!(e.shape().unwrap().fill, "gold");
}

#[test]
fn revert_restores_original_color() {
    let mut e = conditional(0.0, 0.0, None, Property::X, "==", Scalar::Number(0.0), recolor("gold"));
    assert!(!revert(&mut e));
    apply(&mut e);
    assert!(revert(&mut e));
    assert!(!revert(&mut e));
    assert_eq!(e.shape().unwrap().fill, BASE);
}

#[test]
fn reposition_moves_and_restores() {
    let mut e = conditional(5.0, 6.0, None, Property::X, "==", Scalar::Number(0.0), Transform::Reposition {
        x: 100.0,
        y: 200.0,
    });
    apply(&mut e);
    assert_eq!((e.x, e.y), (100.0, 200.0));
    revert(&mut e);
    assert_eq!((e.x, e.y), (5.0, 6.0));
}

#[test]
fn apply_on_non_conditional_is_noop() {
    let mut e = rect(0.0, 0.0, 1.0, 1.0);
    assert!(!apply(&mut e));
    assert!(!revert(&mut e));
}

// =============================================================
// evaluate_all
// =============================================================

#[test]
fn evaluate_all_applies_and_reverts() {
    let mut scene = Scene::new();
    let watched = add(&mut scene, rect(100.0, 0.0, 10.0, 10.0));
    let c = add(
        &mut scene,
        conditional(400.0, 400.0, Some(watched), Property::X, ">", Scalar::Number(50.0), recolor("gold")),
    );

    assert_eq!(evaluate_all(&mut scene), vec![c]);
    assert!(transformed(&scene, c));
    assert_eq!(fill(&scene, c), "gold");

    // Still true: no second application.
    assert!(evaluate_all(&mut scene).is_empty());

    scene.get_mut(&watched).unwrap().x = 10.0;
    assert_eq!(evaluate_all(&mut scene), vec![c]);
    assert!(!transformed(&scene, c));
    assert_eq!(fill(&scene, c), BASE);
}

#[test]
fn unresolved_watch_keeps_state() {
    let mut scene = Scene::new();
    let watched = add(&mut scene, rect(100.0, 0.0, 10.0, 10.0));
    let c = add(
        &mut scene,
        conditional(400.0, 400.0, Some(watched), Property::X, ">", Scalar::Number(50.0), recolor("gold")),
    );
    evaluate_all(&mut scene);
    scene.remove(&watched);
    assert!(evaluate_all(&mut scene).is_empty());
    assert!(transformed(&scene, c));
    assert_eq!(fill(&scene, c), "gold");
}

#[test]
fn watch_on_collision_flag() {
    let mut scene = Scene::new();
    let watched = add(&mut scene, rect(0.0, 0.0, 10.0, 10.0));
    let c = add(
        &mut scene,
        conditional(400.0, 400.0, Some(watched), Property::IsColliding, "==", Scalar::Bool(true), recolor("gold")),
    );
    assert!(evaluate_all(&mut scene).is_empty());
    scene.get_mut(&watched).unwrap().shape_mut().unwrap().is_colliding = true;
    assert_eq!(evaluate_all(&mut scene), vec![c]);
}

#[test]
fn snapshot_originals_resets_flag() {
    let mut e = conditional(1.0, 2.0, None, Property::X, "==", Scalar::Number(0.0), recolor("gold"));
    apply(&mut e);
    e.x = 9.0;
    snapshot_originals(&mut e);
    let state = &e.as_conditional().unwrap().state;
    assert!(!state.is_transformed);
    assert_eq!(state.original_x, 9.0);
    assert_eq!(state.original_color, BASE);
}
