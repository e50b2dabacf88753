//! Scripted input standing in for a window's event stream

use prev_engine::glam::Vec2;
use prev_engine::prev::scene::InputEvent;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

pub struct InputScript {
    /// `(frame, event)` pairs, sorted by frame
    events: Vec<(u32, InputEvent)>,
}

impl InputScript {
    /// Walk forward, look around, jump, click at the screen centre, strafe,
    /// zoom out and drop the last stone
    pub fn walkabout(width: u32, height: u32) -> Self {
        let centre = Vec2::new(width as f32 / 2.0, height as f32 / 2.0);
        let mut events = vec![
            (0, InputEvent::WindowResize { width, height }),
            (5, InputEvent::key_down(KeyCode::KeyW)),
            (40, InputEvent::MouseButton { button: MouseButton::Right, pressed: true, position: centre }),
            (60, InputEvent::key_up(KeyCode::KeyW)),
            (70, InputEvent::key_down(KeyCode::Space)),
            (71, InputEvent::key_up(KeyCode::Space)),
            (100, InputEvent::MouseButton { button: MouseButton::Left, pressed: true, position: centre }),
            (101, InputEvent::MouseButton { button: MouseButton::Left, pressed: false, position: centre }),
            (110, InputEvent::key_down(KeyCode::KeyD)),
            (130, InputEvent::key_up(KeyCode::KeyD)),
            (140, InputEvent::MouseScroll { delta: -10.0 }),
            (150, InputEvent::key_down(KeyCode::Delete)),
            (151, InputEvent::key_up(KeyCode::Delete)),
        ];

        // a slow drag to the right while the right button is held
        for step in 1..=10u32 {
            let position = centre + Vec2::new(step as f32 * 4.0, 0.0);
            events.push((40 + step, InputEvent::MouseMove { position, delta: Vec2::new(4.0, 0.0) }));
        }
        events.push((51, InputEvent::MouseButton { button: MouseButton::Right, pressed: false, position: centre }));

        events.sort_by_key(|(frame, _)| *frame);
        Self { events }
    }

    pub fn events_at(&self, frame: u32) -> impl Iterator<Item = &InputEvent> + '_ {
        let start = self.events.partition_point(|(at, _)| *at < frame);
        self.events[start..]
            .iter()
            .take_while(move |(at, _)| *at == frame)
            .map(|(_, event)| event)
    }

    pub fn last_frame(&self) -> u32 {
        self.events.last().map_or(0, |(frame, _)| *frame)
    }
}
