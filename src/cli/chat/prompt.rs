use rustyline::{Config, Editor, Result};

pub fn generate_prompt(user_label: Option<&str>) -> String {
    format!("{} › ", user_label.unwrap_or("you"))
}

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .history_ignore_dups(true)
        .max_history_size(200)
        .build();
    Editor::with_config(config)
}
