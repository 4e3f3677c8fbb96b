//! Two-way link between the sphere settings panel and the sphere object.
//!
//! Writes made by one side must not be echoed back by the other side's
//! change callback. Every callback checks `suppress_feedback` first, and
//! the flag is raised for the duration of each write.

use plenoptic_core::SphereSpec;
use serde::{Deserialize, Serialize};

use crate::host::{SceneHost, SphereObject};

/// Panel-side sphere state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpherePanel {
    pub spec: SphereSpec,
    /// The sphere should be visible and drives the panel.
    pub show_sphere: bool,
    /// A sphere object was created by the panel.
    pub sphere_exists: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SphereLink {
    panel: SpherePanel,
    suppress_feedback: bool,
}

impl SphereLink {
    pub fn new(panel: SpherePanel) -> Self {
        Self {
            panel,
            suppress_feedback: false,
        }
    }

    pub fn panel(&self) -> &SpherePanel {
        &self.panel
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppress_feedback
    }

    /// Run `f` with change callbacks disabled, restoring the previous flag.
    pub fn with_feedback_suppressed<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = std::mem::replace(&mut self.suppress_feedback, true);
        let result = f(self);
        self.suppress_feedback = previous;
        result
    }

    /// Panel edited: push the new values to the sphere object, if any.
    pub fn on_panel_changed(&mut self, host: &mut dyn SceneHost, spec: SphereSpec) {
        if self.suppress_feedback {
            return;
        }
        self.panel.spec = spec;
        if let Some(object) = host.sphere_object() {
            let spec = self.panel.spec.clone();
            self.with_feedback_suppressed(|_| {
                host.set_sphere_object(Some(SphereObject {
                    spec,
                    hidden: object.hidden,
                }));
            });
        }
    }

    /// Scene changed: pull sphere object values into a visible panel and
    /// drop the flags if the object was deleted.
    pub fn on_object_changed(&mut self, host: &dyn SceneHost) {
        if self.suppress_feedback {
            return;
        }
        match host.sphere_object() {
            Some(object) if self.panel.show_sphere => {
                self.with_feedback_suppressed(|link| link.panel.spec = object.spec);
            }
            Some(_) => {}
            None if self.panel.sphere_exists => {
                log::debug!("sphere object removed from the scene");
                self.panel.show_sphere = false;
                self.panel.sphere_exists = false;
            }
            None => {}
        }
    }

    /// Show or hide the sphere, creating it hidden on first use.
    pub fn toggle_visibility(&mut self, host: &mut dyn SceneHost) {
        if host.sphere_object().is_none() && !self.panel.sphere_exists {
            let spec = self.panel.spec.clone();
            self.with_feedback_suppressed(|_| {
                host.set_sphere_object(Some(SphereObject { spec, hidden: true }));
            });
            self.panel.sphere_exists = true;
        }
        if let Some(mut object) = host.sphere_object() {
            object.hidden = !object.hidden;
            self.panel.show_sphere = !object.hidden;
            self.with_feedback_suppressed(|_| host.set_sphere_object(Some(object)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standalone::{StandaloneHost, StandaloneScene};
    use plenoptic_core::Vec3;

    fn host() -> StandaloneHost {
        StandaloneHost::new(StandaloneScene::default())
    }

    #[test]
    fn toggle_creates_then_flips_visibility() {
        let mut host = host();
        let mut link = SphereLink::default();
        link.toggle_visibility(&mut host);
        assert!(link.panel().sphere_exists);
        assert!(link.panel().show_sphere);
        assert_eq!(host.sphere_object().map(|s| s.hidden), Some(false));

        link.toggle_visibility(&mut host);
        assert!(!link.panel().show_sphere);
        assert_eq!(host.sphere_object().map(|s| s.hidden), Some(true));
        assert!(!link.is_suppressed());
    }

    #[test]
    fn panel_edits_reach_the_object() {
        let mut host = host();
        let mut link = SphereLink::default();
        link.toggle_visibility(&mut host);

        let spec = SphereSpec {
            radius: 2.5,
            ..SphereSpec::default()
        };
        link.on_panel_changed(&mut host, spec.clone());
        assert_eq!(host.sphere_object().unwrap().spec, spec);
    }

    #[test]
    fn object_edits_reach_a_visible_panel_only() {
        let mut host = host();
        let mut link = SphereLink::default();
        link.toggle_visibility(&mut host);

        let moved = SphereSpec {
            center: Vec3::new(1.0, 2.0, 3.0),
            ..SphereSpec::default()
        };
        host.set_sphere_object(Some(SphereObject {
            spec: moved.clone(),
            hidden: false,
        }));
        link.on_object_changed(&host);
        assert_eq!(link.panel().spec, moved);

        link.toggle_visibility(&mut host);
        let mut hidden = host.sphere_object().unwrap();
        hidden.spec.radius = 9.0;
        host.set_sphere_object(Some(hidden));
        link.on_object_changed(&host);
        assert_eq!(link.panel().spec.radius, 4.0);
    }

    #[test]
    fn callbacks_are_inert_while_suppressed() {
        let mut host = host();
        let mut link = SphereLink::default();
        link.toggle_visibility(&mut host);
        let before = host.sphere_object();

        link.with_feedback_suppressed(|link| {
            link.on_panel_changed(
                &mut host,
                SphereSpec {
                    radius: 7.0,
                    ..SphereSpec::default()
                },
            );
            host.set_sphere_object(None);
            link.on_object_changed(&host);
        });
        assert_eq!(link.panel().spec.radius, 4.0);
        assert!(link.panel().sphere_exists);
        assert!(before.is_some());
    }

    #[test]
    fn deleted_sphere_resets_flags() {
        let mut host = host();
        let mut link = SphereLink::default();
        link.toggle_visibility(&mut host);
        host.set_sphere_object(None);
        link.on_object_changed(&host);
        assert!(!link.panel().sphere_exists);
        assert!(!link.panel().show_sphere);
    }
}
