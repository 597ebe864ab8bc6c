use crate::{
    autofix::{AutofixRegistry, FixOutcome},
    config::{AutofixTolerances, ValidationLimits},
    data_structures::scene_graph::{SceneNode, find_mesh_mut},
    resources::{texture::TextureBackend, texture_store::TextureStore},
    validation::{issue::SceneReport, mesh::MeshValidator, scene::SceneValidator},
};

/// Installs the platform logger. Safe to call more than once.
pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            log::debug!("Logger already initialized: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            log::debug!("Logger already initialized: {}", e);
        };
    }
}

/**
 * Everything an editor session needs to keep its scene consistent.
 *
 * The host creates one context and keeps it for the lifetime of the editor, so
 * there is exactly one texture store per process without a global.
 */
pub struct IntegrityContext<B: TextureBackend> {
    pub limits: ValidationLimits,
    pub validator: SceneValidator,
    pub autofix: AutofixRegistry,
    pub textures: TextureStore<B>,
}

impl<B: TextureBackend> IntegrityContext<B> {
    pub fn new(backend: B) -> Self {
        Self::with_limits(backend, ValidationLimits::default())
    }

    pub fn with_limits(backend: B, limits: ValidationLimits) -> Self {
        Self {
            validator: SceneValidator::new(MeshValidator::new(limits.clone())),
            autofix: AutofixRegistry::new(&AutofixTolerances::from(&limits)),
            textures: TextureStore::new(backend),
            limits,
        }
    }

    pub fn validate(&self, root: &dyn SceneNode) -> SceneReport {
        self.validator.validate(root)
    }

    /// Runs the repair `fix_name` on the mesh with unique id `mesh_id` below `root`.
    pub fn fix_mesh(&self, root: &mut dyn SceneNode, mesh_id: u32, fix_name: &str) -> FixOutcome {
        match find_mesh_mut(root, mesh_id) {
            Some(mesh) => self.autofix.fix_by_name(fix_name, mesh),
            None => FixOutcome {
                ok: false,
                message: format!("no mesh with id {mesh_id} in scene"),
            },
        }
    }
}
