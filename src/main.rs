use anyhow::{Context, Result};
use letter_for_living::config::Config;
use letter_for_living::planner::{self, OpenAiGenerator, PlanRequest};
use letter_for_living::{
    api, blog, brief, genlog, init, ledger, overrides, progress, prompts, shorts, store, theme,
};
use std::path::{Path, PathBuf};

fn usage() -> ! {
    eprintln!(
        "Usage: lfl-studio <command> [args]\n\n\
         Commands:\n  \
         themes                              list the theme catalog\n  \
         used                                list used verses grouped by theme\n  \
         briefs                              list logged and stray brief files\n  \
         add <reference>                     add a verse to the used ledger\n  \
         remove <reference>                  remove a verse from the used ledger\n  \
         plan <theme-number> [options]       generate and persist a poster brief\n    \
         --size <size>       (default A2)\n    \
         --tone <keywords>\n    \
         --notes <verse or memo>\n    \
         --color <mode>      (default 1도)\n  \
         blog <brief.md> [--hashtags N]      write a blog post from a brief\n  \
         shorts <brief.md> [options]         draft a shorts script and render assets\n    \
         --length <label>    (default 60초)\n    \
         --cuts <n>          (default 5)\n    \
         --voice <name>      (default alloy)\n    \
         --image <path>      (repeatable, skips image generation)"
    );
    std::process::exit(2);
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|idx| args.get(idx + 1))
        .cloned()
}

fn flag_values(args: &[String], name: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == name {
            if let Some(value) = iter.next() {
                out.push(value.clone());
            }
        }
    }
    out
}

fn project_root() -> PathBuf {
    std::env::var("LFL_PROJECT_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

async fn load_config() -> Result<Config> {
    let root = project_root();
    let env_path = root.join(".env");
    let config = Config::load(root, &env_path).await?;
    init::ensure_directories(&config).await?;
    Ok(config)
}

async fn cmd_themes(config: &Config) -> Result<()> {
    for item in theme::read_themes(&config.themes_path).await? {
        println!("{}", item);
    }
    Ok(())
}

async fn cmd_used(config: &Config) -> Result<()> {
    let used = ledger::read_used_verses(&config.used_verses_path).await?;
    let catalog = theme::read_themes(&config.themes_path).await?;
    let log_map = genlog::load_used_theme_map(&config.log_path).await?;
    let overrides_map = overrides::load_theme_overrides(&config.theme_map_path).await?;
    let effective = overrides::effective_theme_map(&log_map, &overrides_map, &catalog);
    let links = brief::load_brief_links(&config.log_path, &config.project_root).await?;

    let sorted: Vec<String> = used.iter().cloned().collect();
    for (group, verses) in theme::group_used_by_theme(&sorted, &effective, &catalog) {
        println!("{} ({})", group, verses.len());
        for verse in verses {
            match links.get(&verse) {
                Some(link) => println!("  - {}  [{}]", verse, link),
                None => println!("  - {}", verse),
            }
        }
    }
    Ok(())
}

async fn cmd_briefs(config: &Config) -> Result<()> {
    let catalog = theme::read_themes(&config.themes_path).await?;
    let entries = brief::load_brief_entries(
        &config.project_root,
        &config.log_path,
        &config.briefs_dir,
        &catalog,
    )
    .await?;
    if entries.is_empty() {
        println!("기획서가 없습니다.");
        return Ok(());
    }
    for entry in entries {
        let date = if entry.date.is_empty() { "-" } else { &entry.date };
        let verse = if entry.verse_reference.is_empty() {
            "-"
        } else {
            &entry.verse_reference
        };
        println!("{}  {}  {}  {}", date, verse, entry.theme, entry.brief_path);
    }
    Ok(())
}

async fn cmd_add(config: &Config, args: &[String]) -> Result<()> {
    let Some(verse) = args.first() else {
        usage();
    };
    ledger::append_used_verse(&config.used_verses_path, verse).await?;
    println!("추가되었습니다: {}", verse);
    Ok(())
}

async fn cmd_remove(config: &Config, args: &[String]) -> Result<()> {
    let Some(verse) = args.first() else {
        usage();
    };
    ledger::remove_used_verse(&config.used_verses_path, verse).await?;
    println!("삭제되었습니다: {}", verse);
    Ok(())
}

async fn cmd_plan(config: &Config, args: &[String]) -> Result<()> {
    let Some(theme_arg) = args.first() else {
        usage();
    };
    let catalog = theme::read_themes(&config.themes_path).await?;
    let selected = catalog
        .iter()
        .find(|item| {
            item.as_str() == theme_arg
                || item.starts_with(&format!("{}.", theme_arg))
                || item.starts_with(&format!("{})", theme_arg))
        })
        .cloned()
        .with_context(|| format!("unknown theme: {}", theme_arg))?;

    let request = PlanRequest {
        theme: selected,
        size: flag_value(args, "--size").unwrap_or_else(|| "A2".to_string()),
        tone: flag_value(args, "--tone").unwrap_or_default(),
        notes: flag_value(args, "--notes").unwrap_or_default(),
        color_mode: flag_value(args, "--color").unwrap_or_else(|| "1도".to_string()),
    };

    let generator = OpenAiGenerator::new(reqwest::Client::new(), config.clone());
    let outcome = planner::plan(config, &generator, &request).await?;
    println!("기획서가 생성되었습니다.");
    println!("verse: {}", outcome.brief.verse_reference);
    println!("brief: {}", outcome.brief_path.display());
    Ok(())
}

async fn cmd_blog(config: &Config, args: &[String]) -> Result<()> {
    let Some(brief_arg) = args.first() else {
        usage();
    };
    let data = brief::parse_brief_file(Path::new(brief_arg)).await?;
    let hashtags: u32 = flag_value(args, "--hashtags")
        .and_then(|v| v.parse().ok())
        .unwrap_or(5);

    let client = reqwest::Client::new();
    let prompt = prompts::build_blog_prompt(&data, hashtags, "");
    let value =
        api::openai::call_openai_json_long(&client, config, &config.blog_model, &prompt).await?;
    let post = blog::normalize_blog_result(&value);
    if post.body.is_empty() {
        anyhow::bail!("블로그 본문이 비어 있습니다.");
    }

    blog::append_blog_log(&config.blog_log_path, &post, &data).await?;
    let draft_id = store::new_draft_id();
    store::save_draft(&config.drafts_dir, &draft_id, &post).await?;

    // Section images are best-effort; the post stands without them.
    let section_prompts: Vec<String> = prompts::build_image_prompts(&data)
        .into_iter()
        .map(|(_, prompt)| prompt)
        .collect();
    let image_paths = api::images::generate_images(
        &client,
        config,
        &section_prompts,
        &config.blog_images_dir,
        "1024x1024",
        &draft_id,
    )
    .await?;
    if !image_paths.is_empty() {
        let paths: Vec<String> = image_paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        blog::record_blog_images(&config.blog_image_map_path, &draft_id, &paths).await?;
    }

    println!("{}", post.title);
    println!();
    println!("{}", post.body);
    println!();
    println!("{}", post.hashtags);
    println!();
    println!("draft: {}", draft_id);
    for path in &image_paths {
        println!("image: {}", path.display());
    }
    Ok(())
}

async fn cmd_shorts(config: &Config, args: &[String]) -> Result<()> {
    let Some(brief_arg) = args.first() else {
        usage();
    };
    let data = brief::parse_brief_file(Path::new(brief_arg)).await?;
    let length = flag_value(args, "--length").unwrap_or_else(|| "60초".to_string());
    let cuts: u32 = flag_value(args, "--cuts")
        .and_then(|v| v.parse().ok())
        .unwrap_or(5);
    let voice = flag_value(args, "--voice").unwrap_or_else(|| "alloy".to_string());

    let client = reqwest::Client::new();
    let prompt = prompts::build_shorts_prompt(&data, &length, cuts, "");
    let value =
        api::openai::call_openai_json(&client, config, &config.openai_model, &prompt).await?;
    let draft = shorts::parse_shorts_draft(&value)?;
    println!("{}", draft.title);
    println!();
    println!("{}", draft.script);

    let job = shorts::ShortsJob {
        script: draft.script.clone(),
        image_paths: flag_values(args, "--image"),
        image_prompts: draft.image_prompts.clone(),
        voice,
        total_seconds: shorts::parse_length_seconds(&length),
    };
    shorts::spawn_shorts_job(config.clone(), job);

    // The job reports through the progress file; poll it to completion.
    let mut printed = 0;
    loop {
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        let state = progress::load_progress(&config.shorts_progress_path).await;
        for step in state.steps.iter().skip(printed) {
            eprintln!("[..] {}", step);
        }
        printed = state.steps.len();
        match state.status.as_str() {
            "done" => {
                for item in state.outputs {
                    println!("{}: {}", item.label, item.path);
                }
                return Ok(());
            }
            "error" => {
                anyhow::bail!("숏츠 작업 실패: {}", state.steps.join(" / "));
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        usage();
    };
    let rest = &args[1..];

    let config = load_config().await?;
    match command.as_str() {
        "themes" => cmd_themes(&config).await,
        "used" => cmd_used(&config).await,
        "briefs" => cmd_briefs(&config).await,
        "add" => cmd_add(&config, rest).await,
        "remove" => cmd_remove(&config, rest).await,
        "plan" => cmd_plan(&config, rest).await,
        "blog" => cmd_blog(&config, rest).await,
        "shorts" => cmd_shorts(&config, rest).await,
        _ => usage(),
    }
}
