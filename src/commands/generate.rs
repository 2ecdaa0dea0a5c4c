//! Generate static files

use anyhow::Result;

use crate::cms::CmsClient;
use crate::generator::Generator;
use crate::Voyager;

/// Run the build phase against the configured content source
pub async fn run(app: &Voyager) -> Result<()> {
    let start = std::time::Instant::now();

    let source = CmsClient::new(&app.config.api);
    let generator = Generator::new(app)?;
    generator.generate(&source).await?;

    let duration = start.elapsed();
    tracing::info!("Generated in {:.2}s", duration.as_secs_f64());

    Ok(())
}
