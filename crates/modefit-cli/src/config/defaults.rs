pub struct DefaultsConfig {
    pub cutoff: f64,
    pub gamma: f64,
    pub num_modes: usize,
    pub num_frames: usize,
    pub scaling_coefficient: f64,
    pub form_factor: f64,
    pub fit_scale: bool,
    pub log_scale: bool,
    pub calpha_only: bool,
    pub analysis_modes: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            cutoff: 15.0,
            gamma: 1.0,
            num_modes: 5,
            num_frames: 20,
            scaling_coefficient: 3.0,
            form_factor: 1.0,
            fit_scale: true,
            log_scale: false,
            calpha_only: true,
            analysis_modes: 20,
        }
    }
}
