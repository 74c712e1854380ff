//! Camera frame provider: per-mode pivot rigs and the third/first-person
//! switcher that also decides look ownership.

/// Horizontal reference frame of the active viewpoint, sampled once per tick.
#[derive(Debug, Clone, Copy)]
pub struct CameraFrame {
    /// Unit forward projected onto the XZ plane
    pub forward_xz: [f32; 2],
    /// Unit right projected onto the XZ plane
    pub right_xz: [f32; 2],
    /// Yaw about the world Y axis, radians
    pub yaw: f32,
}

impl CameraFrame {
    /// Builds a frame from a yaw angle. Local forward is -Z at yaw 0.
    pub fn from_yaw(yaw: f32) -> Self {
        let (sin, cos) = yaw.sin_cos();
        Self {
            forward_xz: [-sin, -cos],
            right_xz: [cos, -sin],
            yaw,
        }
    }
}

/// Orbit pivot the motor feeds look deltas into when it owns the look.
/// Yaw is unconstrained; pitch is clamped here, at the rig.
#[derive(Debug, Clone, Copy)]
pub struct CameraRig {
    pub yaw: f32,
    pub pitch: f32,
    pub pitch_limit: f32,
}

impl CameraRig {
    pub fn new() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            pitch_limit: 85.0_f32.to_radians(),
        }
    }

    /// Accumulates a look delta scaled by sensitivity and elapsed time.
    pub fn apply_look(&mut self, look: [f32; 2], sensitivity: f32, dt: f32) {
        self.yaw += look[0] * sensitivity * dt;
        self.pitch = (self.pitch - look[1] * sensitivity * dt)
            .clamp(-self.pitch_limit, self.pitch_limit);
    }

    pub fn frame(&self) -> CameraFrame {
        CameraFrame::from_yaw(self.yaw)
    }
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    ThirdPerson,
    FirstPerson,
}

/// Swaps the active camera rig between modes and reports whether the motor
/// should keep driving the pivot. In first person with an external pov
/// controller the motor gives up look ownership.
pub struct CameraSwitcher {
    mode: CameraMode,
    third_person: CameraRig,
    first_person: CameraRig,
    pub use_pov_for_first_person: bool,
}

impl CameraSwitcher {
    pub fn new() -> Self {
        Self {
            mode: CameraMode::ThirdPerson,
            third_person: CameraRig::new(),
            first_person: CameraRig::new(),
            use_pov_for_first_person: true,
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    /// Flips between third and first person, carrying yaw over so the view
    /// does not snap.
    pub fn toggle(&mut self) {
        let from_yaw = self.active_rig().yaw;
        self.mode = match self.mode {
            CameraMode::ThirdPerson => CameraMode::FirstPerson,
            CameraMode::FirstPerson => CameraMode::ThirdPerson,
        };
        self.active_rig_mut().yaw = from_yaw;
    }

    /// Whether the motor owns look accumulation in the current mode
    pub fn motor_controls_look(&self) -> bool {
        self.mode == CameraMode::ThirdPerson || !self.use_pov_for_first_person
    }

    pub fn active_rig(&self) -> &CameraRig {
        match self.mode {
            CameraMode::ThirdPerson => &self.third_person,
            CameraMode::FirstPerson => &self.first_person,
        }
    }

    pub fn active_rig_mut(&mut self) -> &mut CameraRig {
        match self.mode {
            CameraMode::ThirdPerson => &mut self.third_person,
            CameraMode::FirstPerson => &mut self.first_person,
        }
    }

    pub fn frame(&self) -> CameraFrame {
        self.active_rig().frame()
    }
}

impl Default for CameraSwitcher {
    fn default() -> Self {
        Self::new()
    }
}
