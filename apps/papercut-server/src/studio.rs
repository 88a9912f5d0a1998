/// Generation workflow shared by the HTTP handlers
/// prompt -> image backend -> papercut pipeline -> scene mock-ups -> storage

use ai_pipeline::{
    ComfyUiGenerator, FallbackGenerator, GeneratedImage, GenerationRequest, ImageGenerator,
    PlaceholderGenerator,
};
use anyhow::Context;
use chrono::Utc;
use effects::PapercutPipeline;
use image::{DynamicImage, ImageFormat, RgbImage};
use renderer::{Scene, SceneLibrary};
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::models::Generation;
use crate::storage::{tagged_name, GenerationStore, ImageKind};

pub struct Studio {
    pub config: ServerConfig,
    generator: FallbackGenerator,
    pipeline: Arc<PapercutPipeline>,
    scenes: Arc<SceneLibrary>,
    store: GenerationStore,
}

/// Papercut and scene PNGs for a generated image, not yet stored
pub struct Processed {
    png: Vec<u8>,
    width: u32,
    height: u32,
    scenes: Vec<(Scene, Vec<u8>)>,
}

impl Studio {
    pub fn from_config(config: ServerConfig) -> anyhow::Result<Self> {
        let comfyui = ComfyUiGenerator::new(config.comfyui.clone())
            .context("failed to create ComfyUI client")?;
        let placeholder = PlaceholderGenerator::new(config.placeholder_image.clone());
        let generator = FallbackGenerator::new(Box::new(comfyui), placeholder)
            .force_placeholder(config.force_placeholder);

        let pipeline = Arc::new(PapercutPipeline::new(config.papercut.clone()));
        let scenes = Arc::new(SceneLibrary::new(
            config.assets_dir.clone(),
            config.scene_placeholders,
        ));
        let store = GenerationStore::new(&config.data_dir)?;

        Ok(Self {
            config,
            generator,
            pipeline,
            scenes,
            store,
        })
    }

    pub fn store(&self) -> &GenerationStore {
        &self.store
    }

    pub fn pipeline(&self) -> &PapercutPipeline {
        &self.pipeline
    }

    pub async fn comfyui_available(&self) -> bool {
        self.generator.primary_available().await
    }

    pub fn placeholder_forced(&self) -> bool {
        self.generator.is_forced()
    }

    /// Generate from a prompt; backend errors keep their type for status mapping
    pub async fn generate_image(&self, request: &GenerationRequest) -> ai_pipeline::Result<GeneratedImage> {
        info!("generating papercut for '{}'", request.prompt.trim());
        self.generator.generate(request).await
    }

    /// Run the papercut pipeline and render scenes off the async runtime
    pub async fn process(&self, image: &GeneratedImage) -> anyhow::Result<Processed> {
        let pipeline = Arc::clone(&self.pipeline);
        let scenes = Arc::clone(&self.scenes);
        let raw = image.bytes.clone();

        tokio::task::spawn_blocking(move || run_pipeline(&pipeline, &scenes, &raw))
            .await
            .context("processing task panicked")?
    }

    /// Write every image of a generation and record it.
    /// Files are tagged with the generation id, so concurrent generations
    /// never share a name. Nothing is left behind when a write fails.
    pub fn save(&self, image: GeneratedImage, processed: Processed) -> anyhow::Result<Generation> {
        let id = Uuid::new_v4().to_string();
        let tag = id[..8].to_string();
        let created_at = Utc::now();
        let download_name = format!("papercut_{}.png", created_at.timestamp());

        let mut generation = Generation {
            raw_file: tagged_name(&image.filename, &tag),
            processed_file: tagged_name(&download_name, &tag),
            id,
            prompt: image.prompt,
            full_prompt: image.full_prompt,
            seed: image.seed,
            placeholder: image.placeholder,
            download_name,
            scenes: Vec::new(),
            sha256: format!("{:x}", Sha256::digest(&processed.png)),
            width: processed.width,
            height: processed.height,
            created_at,
        };

        let mut written: Vec<(ImageKind, String)> = Vec::new();
        let result = self.write_all(&mut generation, &image.bytes, &processed, &mut written);
        if let Err(e) = result {
            for (kind, name) in &written {
                self.store.remove_image(*kind, name);
            }
            return Err(e);
        }

        info!(
            "generation {} stored ({}x{}, {} scenes, placeholder={})",
            generation.id,
            generation.width,
            generation.height,
            generation.scenes.len(),
            generation.placeholder
        );
        self.store.insert(generation)
    }

    fn write_all(
        &self,
        generation: &mut Generation,
        raw: &[u8],
        processed: &Processed,
        written: &mut Vec<(ImageKind, String)>,
    ) -> anyhow::Result<()> {
        self.store
            .write_image(ImageKind::Raw, &generation.raw_file, raw)?;
        written.push((ImageKind::Raw, generation.raw_file.clone()));

        self.store
            .write_image(ImageKind::Processed, &generation.processed_file, &processed.png)?;
        written.push((ImageKind::Processed, generation.processed_file.clone()));

        for (scene, png) in &processed.scenes {
            let name = generation.scene_file(scene.as_str());
            self.store.write_image(ImageKind::Rendered, &name, png)?;
            written.push((ImageKind::Rendered, name));
            generation.scenes.push(scene.as_str().to_string());
        }
        Ok(())
    }
}

fn run_pipeline(
    pipeline: &PapercutPipeline,
    scenes: &SceneLibrary,
    raw: &[u8],
) -> anyhow::Result<Processed> {
    let source = image::load_from_memory(raw).context("generated image is not decodable")?;
    let papercut = pipeline.process(&source)?;
    let (width, height) = papercut.dimensions();
    let png = effects::encode_png(&papercut)?;

    let rendered = scenes
        .render_all(&DynamicImage::ImageRgba8(papercut))
        .into_iter()
        .map(|(scene, img)| Ok((scene, encode_rgb_png(img)?)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(Processed {
        png,
        width,
        height,
        scenes: rendered,
    })
}

fn encode_rgb_png(img: RgbImage) -> anyhow::Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}
