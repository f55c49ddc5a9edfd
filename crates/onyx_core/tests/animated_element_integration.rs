//! Integration tests for animatable elements + drawing + repaint coalescing
//!
//! These tests verify that:
//! - Typed property tokens route timeline values into an element
//! - A painted element reflects its animated opacity through scoped drawing
//! - Repaint requests for one element collapse to one per frame

use onyx_animation::{AnimationScheduler, PropertyBinding, Timeline};
use onyx_core::draw::DrawCommand;
use onyx_core::{
    Animatable, Color, DisplayList, DrawContext, ElementId, OpacityScope, PropertyValue, Rect,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
enum BadgeProperty {
    Opacity,
    Fill,
}

struct Badge {
    id: ElementId,
    opacity: f32,
    fill: Color,
}

impl Badge {
    fn paint(&self, ctx: &mut dyn DrawContext) {
        let mut scope = OpacityScope::new(ctx, self.opacity);
        scope.fill_rect(Rect::new(0.0, 0.0, 20.0, 20.0), self.fill.into());
    }
}

impl Animatable for Badge {
    type Property = BadgeProperty;

    fn element_id(&self) -> ElementId {
        self.id
    }

    fn set_property(&mut self, property: BadgeProperty, value: PropertyValue) {
        match (property, value) {
            (BadgeProperty::Opacity, PropertyValue::Float(v)) => self.opacity = v,
            (BadgeProperty::Fill, PropertyValue::Color(c)) => self.fill = c,
            _ => {}
        }
    }

    fn property(&self, property: BadgeProperty) -> PropertyValue {
        match property {
            BadgeProperty::Opacity => self.opacity.into(),
            BadgeProperty::Fill => self.fill.into(),
        }
    }
}

#[test]
fn test_animated_badge_paints_with_current_opacity() {
    let scheduler = AnimationScheduler::new();
    let badge = Rc::new(RefCell::new(Badge {
        id: ElementId::next(),
        opacity: 0.0,
        fill: Color::BLACK,
    }));

    let timeline = Timeline::builder(&scheduler.handle())
        .duration(Duration::from_millis(200))
        .bind(PropertyBinding::new(&badge, BadgeProperty::Opacity, 0.0f32, 1.0))
        .bind(PropertyBinding::new(
            &badge,
            BadgeProperty::Fill,
            Color::BLACK,
            Color::WHITE,
        ))
        .build()
        .unwrap();
    timeline.play().unwrap();
    scheduler.tick(Duration::from_millis(100));

    let mut list = DisplayList::new();
    badge.borrow().paint(&mut list);

    assert_eq!(list.opacity_depth(), 0);
    let (opacity, command) = &list.commands()[0];
    assert!((opacity - 0.5).abs() < 1e-6);
    match command {
        DrawCommand::FillRect { brush, .. } => {
            assert_eq!(*brush, Color::rgb(0.5, 0.5, 0.5).into());
        }
        other => panic!("unexpected command {:?}", other),
    }
}

#[test]
fn test_two_bindings_on_one_element_request_one_repaint() {
    let scheduler = AnimationScheduler::new();
    let delivered = Rc::new(RefCell::new(Vec::new()));
    let d = delivered.clone();
    scheduler.set_repaint_sink(move |id: ElementId| d.borrow_mut().push(id));

    let badge = Rc::new(RefCell::new(Badge {
        id: ElementId::next(),
        opacity: 1.0,
        fill: Color::WHITE,
    }));
    let timeline = Timeline::builder(&scheduler.handle())
        .duration(Duration::from_millis(50))
        .bind(PropertyBinding::new(&badge, BadgeProperty::Opacity, 1.0f32, 0.0))
        .bind(PropertyBinding::new(
            &badge,
            BadgeProperty::Fill,
            Color::WHITE,
            Color::BLACK,
        ))
        .build()
        .unwrap();
    timeline.play().unwrap();

    let mut frames = 0;
    while scheduler.tick(Duration::from_millis(16)) {
        frames += 1;
    }
    frames += 1;

    let id = badge.borrow().id;
    assert_eq!(delivered.borrow().len(), frames);
    assert!(delivered.borrow().iter().all(|d| *d == id));
    assert_eq!(badge.borrow().opacity, 0.0);
}
