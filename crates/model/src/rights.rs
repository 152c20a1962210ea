use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator as _};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Rights {
    full: bool,
    rights: Vec<Rule>,
}

impl Rights {
    pub fn full() -> Self {
        Rights {
            full: true,
            rights: vec![],
        }
    }

    pub fn customer() -> Self {
        Rights {
            full: false,
            rights: vec![],
        }
    }

    pub fn has_rule(&self, rule: Rule) -> bool {
        if self.full {
            return true;
        }
        self.rights.contains(&rule)
    }

    pub fn is_admin(&self) -> bool {
        self.full
    }

    pub fn get_all_rules(&self) -> Vec<(Rule, bool)> {
        Rule::iter().map(|rule| (rule, self.has_rule(rule))).collect()
    }
}

#[derive(EnumIter, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    ViewStatistics,
    ViewUsers,
    ViewPayments,
    ManageChannel,
    Broadcast,
    ExportData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_has_no_admin_rules() {
        let rights = Rights::customer();
        assert!(!rights.is_admin());
        assert!(rights.get_all_rules().iter().all(|(_, has)| !has));
        assert!(!rights.has_rule(Rule::Broadcast));
    }

    #[test]
    fn test_full_rights() {
        let rights = Rights::full();
        assert!(rights.is_admin());
        assert!(rights.has_rule(Rule::ManageChannel));
        assert!(rights.has_rule(Rule::ExportData));
    }
}
