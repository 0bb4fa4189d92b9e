use std::path::{Path, PathBuf};

/// Locations of generated artifacts inside a Laravel project.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn storage_app_dir(&self) -> PathBuf {
        self.root.join("storage").join("app")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("storage").join("logs")
    }

    pub fn models_dir(&self) -> PathBuf {
        self.root.join("app").join("Models")
    }

    pub fn model_path(&self, entity: &str) -> PathBuf {
        self.models_dir().join(format!("{entity}.php"))
    }

    pub fn migrations_dir(&self) -> PathBuf {
        self.root.join("database").join("migrations")
    }

    pub fn resources_dir(&self) -> PathBuf {
        self.root.join("app").join("Filament").join("Resources")
    }

    pub fn resource_path(&self, entity: &str) -> PathBuf {
        self.resources_dir().join(format!("{entity}Resource.php"))
    }

    /// Directory holding the resource's pages.
    pub fn resource_dir(&self, entity: &str) -> PathBuf {
        self.resources_dir().join(format!("{entity}Resource"))
    }

    pub fn resource_pages_dir(&self, entity: &str) -> PathBuf {
        self.resource_dir(entity).join("Pages")
    }

    pub fn list_page_path(&self, entity: &str, plural: &str) -> PathBuf {
        self.resource_pages_dir(entity).join(format!("List{plural}.php"))
    }

    pub fn create_page_path(&self, entity: &str) -> PathBuf {
        self.resource_pages_dir(entity).join(format!("Create{entity}.php"))
    }

    pub fn edit_page_path(&self, entity: &str) -> PathBuf {
        self.resource_pages_dir(entity).join(format!("Edit{entity}.php"))
    }

    pub fn view_page_path(&self, entity: &str) -> PathBuf {
        self.resource_pages_dir(entity).join(format!("View{entity}.php"))
    }

    pub fn policies_dir(&self) -> PathBuf {
        self.root.join("app").join("Policies")
    }

    pub fn policy_path(&self, entity: &str) -> PathBuf {
        self.policies_dir().join(format!("{entity}Policy.php"))
    }

    pub fn factory_path(&self, entity: &str) -> PathBuf {
        self.root
            .join("database")
            .join("factories")
            .join(format!("{entity}Factory.php"))
    }

    pub fn seeder_path(&self, entity: &str) -> PathBuf {
        self.root
            .join("database")
            .join("seeders")
            .join(format!("{entity}Seeder.php"))
    }
}
