use crate::config::{ToolConfig, ToolFlavor};
use std::path::{Path, PathBuf};

/// VCP-код "Input Source" (MCCS 0x60)
pub const INPUT_SOURCE_VCP: &str = "60";

/// Шаблон вызова внешней утилиты управления монитором
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdcCommand {
    program: PathBuf,
    flavor: ToolFlavor,
}

impl DdcCommand {
    /// Относительный путь с каталогом привязывается к текущему каталогу
    /// процесса: команда запускается уже из каталога утилиты.
    pub fn new(program: impl Into<PathBuf>, flavor: ToolFlavor) -> Self {
        let program = program.into();
        let has_dir = program
            .parent()
            .is_some_and(|parent| !parent.as_os_str().is_empty());

        let program = if has_dir && program.is_relative() {
            std::path::absolute(&program).unwrap_or(program)
        } else {
            program
        };

        Self { program, flavor }
    }

    pub fn from_config(tool: &ToolConfig) -> Self {
        Self::new(tool.program.clone(), tool.flavor)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self, monitor: &str, input_code: &str) -> Vec<String> {
        match self.flavor {
            ToolFlavor::Ddcutil => vec![
                "--bus".to_string(),
                monitor.to_string(),
                "setvcp".to_string(),
                INPUT_SOURCE_VCP.to_string(),
                input_code.to_string(),
            ],
            ToolFlavor::ControlMyMonitor => vec![
                "/SetValue".to_string(),
                monitor.to_string(),
                INPUT_SOURCE_VCP.to_string(),
                input_code.to_string(),
            ],
        }
    }

    /// Каталог самой утилиты, если она задана путём, а не именем из PATH
    pub fn working_dir(&self) -> Option<&Path> {
        self.program
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
    }

    /// Строка команды для лога
    pub fn render(&self, monitor: &str, input_code: &str) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args(monitor, input_code));
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ddcutil_template() {
        let cmd = DdcCommand::new("ddcutil", ToolFlavor::Ddcutil);
        assert_eq!(cmd.args("1", "15"), vec!["--bus", "1", "setvcp", "60", "15"]);
        assert_eq!(cmd.render("1", "15"), "ddcutil --bus 1 setvcp 60 15");
        assert_eq!(cmd.working_dir(), None);
    }

    #[test]
    fn test_control_my_monitor_template() {
        let cmd = DdcCommand::new("/opt/tools/ControlMyMonitor.exe", ToolFlavor::ControlMyMonitor);
        assert_eq!(
            cmd.args("M3LMQS370483", "18"),
            vec!["/SetValue", "M3LMQS370483", "60", "18"]
        );
        assert_eq!(cmd.working_dir(), Some(Path::new("/opt/tools")));
    }

    #[test]
    fn test_relative_program_is_made_absolute() {
        let cmd = DdcCommand::new("tools/ControlMyMonitor.exe", ToolFlavor::ControlMyMonitor);
        let cwd = std::env::current_dir().unwrap();

        assert!(cmd.program().is_absolute());
        assert_eq!(cmd.program(), cwd.join("tools").join("ControlMyMonitor.exe"));
        assert_eq!(cmd.working_dir(), Some(cwd.join("tools").as_path()));
    }

    #[test]
    fn test_bare_program_name_stays_for_path_lookup() {
        let cmd = DdcCommand::new("ddcutil", ToolFlavor::Ddcutil);
        assert_eq!(cmd.program(), Path::new("ddcutil"));
    }
}
