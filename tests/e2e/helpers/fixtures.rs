use anyhow::Result;
use podcast_studio::domain::pipeline::RunLayout;
use podcast_studio::domain::shared::SegmentFile;
use std::path::{Path, PathBuf};

pub const SCRIPT: &str = "**罗永浩：**大家好，欢迎收听科技双响炮。\n\
**王自如：**今天我们聊三条新闻。\n\
**罗永浩：**第一条是关于芯片的。\n";

pub struct TestFixtures {
    root: PathBuf,
}

impl TestFixtures {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn layout(&self, date: &str) -> RunLayout {
        RunLayout::new(&self.root, date)
    }

    pub async fn write_script(&self, date: &str, script: &str) -> Result<()> {
        let layout = self.layout(date);
        tokio::fs::create_dir_all(layout.dir()).await?;
        tokio::fs::write(layout.script_path(), script).await?;
        Ok(())
    }

    pub async fn write_segment(&self, date: &str, index: usize, bytes: &[u8]) -> Result<()> {
        let splits = self.layout(date).splits_dir();
        tokio::fs::create_dir_all(&splits).await?;
        SegmentFile::for_unit(&splits, index).write(bytes).await?;
        Ok(())
    }

    pub async fn read_final_audio(&self, date: &str) -> Result<String> {
        let bytes = tokio::fs::read(self.layout(date).final_audio_path()).await?;
        Ok(String::from_utf8(bytes)?)
    }
}
