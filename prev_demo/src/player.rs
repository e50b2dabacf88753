//! Third-person player: walks and jumps over the terrain with a follow camera

use prev_engine::glam::{Quat, Vec2, Vec3};
use prev_engine::prev::component::{
    AnimationRenderComponent, AnimationState, BoundingVolumeComponent, CameraComponent, TerrainManagerComponent,
    TransformComponent,
};
use prev_engine::prev::scene::node_component_helper as helper;
use prev_engine::prev::scene::tags::TAG_TERRAIN_MANAGER_COMPONENT;
use prev_engine::prev::scene::{InputEvent, LogicOp, NodeBehavior, NodeContext, TagSet};
use prev_engine::prev::Result;
use winit::event::{MouseButton, TouchPhase};
use winit::keyboard::KeyCode;

const RUN_SPEED: f32 = 30.0;
const GRAVITY_Y: f32 = -50.0;
const JUMP_POWER: f32 = 30.0;
/// Degrees per pixel of mouse travel
const TURN_SPEED: f32 = 0.2;
const CAMERA_HEIGHT: f32 = 8.0;
const MIN_CAMERA_DISTANCE: f32 = 10.0;

#[derive(Debug, Default, Clone, Copy)]
struct Movement {
    forward: bool,
    backward: bool,
    left: bool,
    right: bool,
}

impl Movement {
    fn any(&self) -> bool {
        self.forward || self.backward || self.left || self.right
    }

    /// Unit-free direction in the player's local frame
    fn offset(&self, forward: Vec3, right: Vec3) -> Vec3 {
        let mut offset = Vec3::ZERO;
        if self.forward {
            offset += forward;
        }
        if self.backward {
            offset -= forward;
        }
        if self.right {
            offset += right;
        }
        if self.left {
            offset -= right;
        }
        offset
    }
}

#[derive(Debug)]
pub struct Player {
    movement: Movement,
    rotating: bool,
    last_pointer: Option<Vec2>,
    pending_turn: Vec2,
    upward_speed: f32,
    in_the_air: bool,
    camera_distance: f32,
}

impl Player {
    pub fn new(camera_distance: f32) -> Self {
        Self {
            movement: Movement::default(),
            rotating: false,
            last_pointer: None,
            pending_turn: Vec2::ZERO,
            upward_speed: 0.0,
            in_the_air: false,
            camera_distance,
        }
    }

    fn jump(&mut self) {
        if !self.in_the_air {
            self.upward_speed = JUMP_POWER;
            self.in_the_air = true;
        }
    }

    fn on_key(&mut self, code: KeyCode, pressed: bool) {
        match code {
            KeyCode::KeyW => self.movement.forward = pressed,
            KeyCode::KeyS => self.movement.backward = pressed,
            KeyCode::KeyA => self.movement.left = pressed,
            KeyCode::KeyD => self.movement.right = pressed,
            KeyCode::Space if pressed => self.jump(),
            _ => {}
        }
    }

    fn on_pointer_move(&mut self, position: Vec2) {
        if let Some(last) = self.last_pointer {
            self.pending_turn += position - last;
        }
        self.last_pointer = Some(position);
    }
}

impl NodeBehavior for Player {
    fn name(&self) -> &str {
        "Player"
    }

    fn update(&mut self, ctx: &mut NodeContext<'_>, delta_time: f32) -> Result<()> {
        let root = ctx.root();
        let terrain = helper::find_one::<dyn TerrainManagerComponent>(
            ctx.graph, root, &TagSet::from(TAG_TERRAIN_MANAGER_COMPONENT), LogicOp::And)?;
        let transform = helper::get_component::<dyn TransformComponent>(ctx.graph, ctx.node)?;
        let animation = helper::get_component::<dyn AnimationRenderComponent>(ctx.graph, ctx.node)?;
        let camera = helper::get_component::<dyn CameraComponent>(ctx.graph, ctx.node)?;
        let volume = helper::get_component::<dyn BoundingVolumeComponent>(ctx.graph, ctx.node)?;

        let mut transform = transform.borrow_mut();
        let mut camera = camera.borrow_mut();

        let walking = self.movement.any() && !self.in_the_air;
        if walking {
            let orientation = transform.orientation();
            let offset = self.movement.offset(orientation * Vec3::NEG_Z, orientation * Vec3::X);
            transform.translate(offset.normalize_or_zero() * RUN_SPEED * delta_time);
        }
        {
            let mut animation = animation.borrow_mut();
            animation.set_state(if walking { AnimationState::Running } else { AnimationState::Paused });
            animation.update(delta_time);
        }

        let position = transform.position();
        let ground = terrain.borrow().height_at(position).unwrap_or(0.0);
        if self.in_the_air {
            self.upward_speed += GRAVITY_Y * delta_time;
            transform.translate(Vec3::new(0.0, self.upward_speed * delta_time, 0.0));
            if transform.position().y < ground {
                transform.set_position(Vec3::new(position.x, ground, position.z));
                self.upward_speed = 0.0;
                self.in_the_air = false;
            }
        } else {
            transform.set_position(Vec3::new(position.x, ground, position.z));
        }

        if self.pending_turn != Vec2::ZERO {
            let yaw = (-self.pending_turn.x * TURN_SPEED).to_radians();
            let pitch = (-self.pending_turn.y * TURN_SPEED).to_radians();
            transform.rotate(Quat::from_rotation_y(yaw));
            camera.add_yaw(yaw);
            camera.add_pitch(pitch);
            self.pending_turn = Vec2::ZERO;
        }

        transform.update(delta_time);
        let eye = transform.position() - camera.forward() * self.camera_distance + Vec3::Y * CAMERA_HEIGHT;
        camera.set_position(eye);
        volume.borrow_mut().update(&transform.world_transform_scaled());
        Ok(())
    }

    fn on_event(&mut self, _ctx: &mut NodeContext<'_>, event: &InputEvent) -> Result<()> {
        match *event {
            InputEvent::Key { code, pressed } => self.on_key(code, pressed),
            InputEvent::MouseButton { button: MouseButton::Right, pressed, position } => {
                self.rotating = pressed;
                self.last_pointer = pressed.then_some(position);
            }
            InputEvent::MouseMove { position, .. } if self.rotating => self.on_pointer_move(position),
            InputEvent::MouseScroll { delta } => {
                self.camera_distance = (self.camera_distance - delta).max(MIN_CAMERA_DISTANCE);
            }
            InputEvent::Touch { phase, position, .. } => match phase {
                TouchPhase::Started => {
                    self.last_pointer = Some(position);
                    self.movement.forward = true;
                }
                TouchPhase::Moved => self.on_pointer_move(position),
                TouchPhase::Ended | TouchPhase::Cancelled => {
                    self.last_pointer = None;
                    self.movement.forward = false;
                }
            },
            _ => {}
        }
        Ok(())
    }
}
