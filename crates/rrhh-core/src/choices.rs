#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

pub const SEX: &[Choice] = &[
    Choice {
        value: "M",
        label: "Masculino",
    },
    Choice {
        value: "F",
        label: "Femenino",
    },
    Choice {
        value: "O",
        label: "Otro",
    },
];

pub const ADMIN_ROLE: &str = "admin";
pub const EMPLOYEE_ROLE: &str = "empleado";

pub const ROLES: &[Choice] = &[
    Choice {
        value: ADMIN_ROLE,
        label: "Administrador",
    },
    Choice {
        value: EMPLOYEE_ROLE,
        label: "Empleado",
    },
];

/// Display label for a stored value, falling back to the value itself.
pub fn label_of(choices: &[Choice], value: &str) -> String {
    choices
        .iter()
        .find(|choice| choice.value == value)
        .map(|choice| choice.label.to_owned())
        .unwrap_or_else(|| value.to_owned())
}
