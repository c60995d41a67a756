use gallery_core::config::ProjectsConfig;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub curated: bool,
}

/// Project lookup, read-only after startup. Entries come from config; when
/// `assume_curated` is set, unknown projects resolve to a synthesized
/// curated entry until an authoritative registry feed replaces this.
pub struct ProjectRegistry {
    projects: HashMap<u64, Project>,
    assume_curated: bool,
}

impl ProjectRegistry {
    pub fn from_config(cfg: &ProjectsConfig) -> Self {
        let projects = cfg
            .curated
            .iter()
            .map(|p| {
                (
                    p.id,
                    Project {
                        name: p.name.clone(),
                        curated: p.curated,
                    },
                )
            })
            .collect();
        Self {
            projects,
            assume_curated: cfg.assume_curated,
        }
    }

    pub fn lookup(&self, project_id: u64) -> Option<Project> {
        if let Some(project) = self.projects.get(&project_id) {
            return Some(project.clone());
        }
        if self.assume_curated {
            return Some(Project {
                name: format!("Art Blocks #{project_id}"),
                curated: true,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::ProjectRegistry;
    use gallery_core::config::{ProjectConfig, ProjectsConfig};

    fn cfg(assume_curated: bool) -> ProjectsConfig {
        ProjectsConfig {
            assume_curated,
            curated: vec![
                ProjectConfig {
                    id: 3,
                    name: "Cryptoblots".to_string(),
                    curated: true,
                },
                ProjectConfig {
                    id: 5,
                    name: "Variant Plan".to_string(),
                    curated: false,
                },
            ],
        }
    }

    #[test]
    fn known_project_resolves() {
        let registry = ProjectRegistry::from_config(&cfg(false));
        let project = registry.lookup(3).unwrap();
        assert_eq!(project.name, "Cryptoblots");
        assert!(project.curated);
    }

    #[test]
    fn listed_non_curated_stays_non_curated() {
        let registry = ProjectRegistry::from_config(&cfg(true));
        assert!(!registry.lookup(5).unwrap().curated);
    }

    #[test]
    fn unknown_project_follows_assume_flag() {
        let strict = ProjectRegistry::from_config(&cfg(false));
        assert!(strict.lookup(99).is_none());

        let lenient = ProjectRegistry::from_config(&cfg(true));
        let project = lenient.lookup(99).unwrap();
        assert!(project.curated);
        assert_eq!(project.name, "Art Blocks #99");
    }
}
