use super::REPL_COMMANDS;

use crate::config::{ensure_parent_exists, Config, GlobalConfig};

use anyhow::{Context, Result};
use reedline::{
    default_emacs_keybindings, default_vi_insert_keybindings, default_vi_normal_keybindings,
    ColumnarMenu, DefaultCompleter, DefaultPrompt, DefaultPromptSegment, EditMode, Emacs,
    FileBackedHistory, KeyCode, KeyModifiers, Keybindings, MenuBuilder, Reedline, ReedlineEvent,
    ReedlineMenu, Vi,
};

const MENU_NAME: &str = "completion_menu";

pub struct Repl {
    pub(crate) editor: Reedline,
    pub(crate) prompt: DefaultPrompt,
}

impl Repl {
    pub fn init(config: &GlobalConfig) -> Result<Self> {
        let commands: Vec<String> = REPL_COMMANDS
            .into_iter()
            .map(|(v, _)| v.to_string())
            .collect();

        let completer = Self::create_completer(&commands);
        let history = Self::create_history()?;
        let menu = Self::create_menu();
        let edit_mode: Box<dyn EditMode> = if config.read().keybindings.is_vi() {
            Box::new(Vi::new(
                default_vi_insert_keybindings(),
                default_vi_normal_keybindings(),
            ))
        } else {
            Box::new(Emacs::new(Self::create_keybindings()))
        };
        let editor = Reedline::create()
            .with_completer(Box::new(completer))
            .with_history(history)
            .with_menu(menu)
            .with_edit_mode(edit_mode);
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("mcpdash".into()),
            DefaultPromptSegment::Empty,
        );
        Ok(Self { editor, prompt })
    }

    fn create_completer(commands: &[String]) -> DefaultCompleter {
        let mut completer = DefaultCompleter::with_inclusions(&['.', '-', '_']).set_min_word_len(2);
        completer.insert(commands.to_vec());
        completer
    }

    fn create_keybindings() -> Keybindings {
        let mut keybindings = default_emacs_keybindings();
        keybindings.add_binding(
            KeyModifiers::NONE,
            KeyCode::Tab,
            ReedlineEvent::UntilFound(vec![
                ReedlineEvent::Menu(MENU_NAME.to_string()),
                ReedlineEvent::MenuNext,
            ]),
        );
        keybindings
    }

    fn create_menu() -> ReedlineMenu {
        let completion_menu = ColumnarMenu::default().with_name(MENU_NAME);
        ReedlineMenu::EngineCompleter(Box::new(completion_menu))
    }

    fn create_history() -> Result<Box<FileBackedHistory>> {
        let path = Config::history_file()?;
        ensure_parent_exists(&path)?;
        Ok(Box::new(
            FileBackedHistory::with_file(1000, path)
                .with_context(|| "Failed to setup history file")?,
        ))
    }
}
