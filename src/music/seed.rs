//! Sample catalog
//!
//! Fills an empty music collection with fabricated entries so a fresh
//! deployment has something to browse.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::model::Music;
use super::store::MusicStore;

/// Number of entries inserted into an empty collection
pub const SEED_COUNT: usize = 10;

const SEED: u64 = 0;

const SAMPLE_FILE_URL: &str =
    "https://res.cloudinary.com/dpoxxjpmu/video/upload/v1688663505/l55gmkryd9u82kql09no.mp3";

const SAMPLE_ARTIST_ID: &str = "b3828065-44e9-4923-8e82-6ca03998a6c4";

const WORDS: &[&str] = &[
    "vinyl", "artisan", "kombucha", "letterpress", "cardigan", "fixie", "polaroid", "typewriter",
    "sriracha", "beard", "flannel", "aesthetic", "bicycle", "locavore", "tofu", "vegan",
    "synth", "mixtape", "ukulele", "moustache", "chillwave", "succulents", "sustainable",
    "tattooed", "wayfarers", "raw", "denim", "brunch", "taxidermy", "normcore", "kale",
    "chambray", "selvage", "farm-to-table", "butcher", "umami", "retro", "pour-over",
    "craft", "lumbersexual",
];

/// Insert [`SEED_COUNT`] entries when the collection is empty.
///
/// Returns how many entries were inserted; zero when the collection already
/// had documents.
pub async fn seed_musics(store: &dyn MusicStore) -> Result<usize, sqlx::Error> {
    if store.count().await? != 0 {
        return Ok(0);
    }

    let musics = generate_musics(SEED, SEED_COUNT);
    for music in &musics {
        store.insert(music).await?;
    }

    tracing::info!(count = musics.len(), "Music collection was empty, seeded sample entries");
    Ok(musics.len())
}

/// Deterministic sample entries for a given seed
pub fn generate_musics(seed: u64, count: usize) -> Vec<Music> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..count)
        .map(|_| {
            let id = uuid::Builder::from_random_bytes(rng.gen::<[u8; 16]>()).into_uuid();
            let title = capitalize(pick(&mut rng));
            let short_desc = sentence(&mut rng, 15);
            let poster_url = format!(
                "https://picsum.photos/250/250?image={}",
                rng.gen_range(0..1000)
            );

            Music {
                id,
                artist_id: SAMPLE_ARTIST_ID.to_string(),
                likes: rng.gen_range(0..10_000),
                file_url: SAMPLE_FILE_URL.to_string(),
                poster_url,
                title,
                short_desc,
            }
        })
        .collect()
}

fn pick(rng: &mut StdRng) -> &'static str {
    WORDS.choose(rng).copied().unwrap_or("music")
}

fn sentence(rng: &mut StdRng, words: usize) -> String {
    let body = (0..words).map(|_| pick(rng)).collect::<Vec<_>>().join(" ");
    format!("{}.", capitalize(&body))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
