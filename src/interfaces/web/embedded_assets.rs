use rust_embed::Embed;

/// プラグインページの静的アセットを埋め込む
#[derive(Embed)]
#[folder = "web/"]
#[include = "*"]
#[include = "**/*"]
pub struct WebAssets;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_assets_available() {
        assert!(WebAssets::get("index.html").is_some());
        assert!(WebAssets::get("css/pfvs.css").is_some());
        assert!(WebAssets::get("js/pfvs.js").is_some());
    }
}
