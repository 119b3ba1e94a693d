use crate::config::Config;
use crate::issue::CertificateService;
use crate::pdf::CertificateRenderer;
use crate::roster::{FileRoster, RosterCache};

pub struct AppState {
    pub service: CertificateService,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        let roster = RosterCache::new(FileRoster::new(&config.roster_path), config.roster_ttl);
        let renderer = CertificateRenderer::new(&config.template_path, &config.font_path);
        Self {
            service: CertificateService::new(roster, renderer),
        }
    }
}
