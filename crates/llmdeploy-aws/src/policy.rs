//! Managed policy sets attached to provisioned users.

use std::fmt;

/// A named, versioned list of IAM managed policy ARNs.
///
/// Bump `version` whenever `arns` changes so that a diff of provisioned
/// users can be traced back to the set they received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicySet {
    /// Name of the set.
    pub name: &'static str,
    /// Revision of the set.
    pub version: u32,
    /// Policy ARNs, attached in this order.
    pub arns: &'static [&'static str],
}

impl PolicySet {
    /// Number of policies in the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.arns.len()
    }

    /// Returns true if the set holds no policies.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.arns.is_empty()
    }

    /// Iterate over the policy ARNs in attachment order.
    pub fn iter(&self) -> impl Iterator<Item = &'static str> {
        self.arns.iter().copied()
    }
}

impl fmt::Display for PolicySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@v{}", self.name, self.version)
    }
}

/// Policies a SageMaker deployer user needs.
pub const SAGEMAKER_DEPLOYER_POLICIES: PolicySet = PolicySet {
    name: "sagemaker-deployer",
    version: 1,
    arns: &[
        "arn:aws:iam::aws:policy/AmazonSageMakerFullAccess",
        "arn:aws:iam::aws:policy/AWSCloudFormationFullAccess",
        "arn:aws:iam::aws:policy/IAMFullAccess",
        "arn:aws:iam::aws:policy/AmazonEC2ContainerRegistryFullAccess",
        "arn:aws:iam::aws:policy/AmazonS3FullAccess",
    ],
};

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn deployer_set_is_exactly_five_managed_policies() {
        let expected: BTreeSet<&str> = [
            "arn:aws:iam::aws:policy/AmazonSageMakerFullAccess",
            "arn:aws:iam::aws:policy/AWSCloudFormationFullAccess",
            "arn:aws:iam::aws:policy/IAMFullAccess",
            "arn:aws:iam::aws:policy/AmazonEC2ContainerRegistryFullAccess",
            "arn:aws:iam::aws:policy/AmazonS3FullAccess",
        ]
        .into_iter()
        .collect();

        let actual: BTreeSet<&str> = SAGEMAKER_DEPLOYER_POLICIES.iter().collect();
        assert_eq!(actual, expected);
        assert_eq!(SAGEMAKER_DEPLOYER_POLICIES.len(), 5);
    }

    #[test]
    fn arns_are_unique_aws_managed() {
        let unique: BTreeSet<&str> = SAGEMAKER_DEPLOYER_POLICIES.iter().collect();
        assert_eq!(unique.len(), SAGEMAKER_DEPLOYER_POLICIES.len());
        assert!(SAGEMAKER_DEPLOYER_POLICIES
            .iter()
            .all(|arn| arn.starts_with("arn:aws:iam::aws:policy/")));
    }

    #[test]
    fn display_includes_version() {
        assert_eq!(
            SAGEMAKER_DEPLOYER_POLICIES.to_string(),
            "sagemaker-deployer@v1"
        );
    }
}
