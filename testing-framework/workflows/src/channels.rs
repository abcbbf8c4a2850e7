use tracing::info;

use crate::{AdminSession, WorkflowError};

impl AdminSession {
    /// Creates every channel listed in the connection profile.
    pub async fn create_all_channels(&self) -> Result<Vec<String>, WorkflowError> {
        let channels = self.target().profile.channel_names();
        for channel in &channels {
            self.create_channel(channel).await?;
        }
        Ok(channels)
    }

    pub async fn create_channel(&self, channel: &str) -> Result<(), WorkflowError> {
        let config_root = self.ctx().fixtures().channel_config_root();
        info!(channel, tls = %self.target().tls, "creating channel");
        self.bounded(
            format!("create channel '{channel}'"),
            self.ctx()
                .admin()
                .create_channel(self.target(), channel, &config_root),
        )
        .await
    }

    pub async fn update_channel(&self, channel: &str, tx_file: &str) -> Result<(), WorkflowError> {
        let config_tx = self.ctx().fixtures().channel_tx(tx_file);
        info!(channel, config_tx = %config_tx.display(), "updating channel");
        self.bounded(
            format!("update channel '{channel}'"),
            self.ctx()
                .admin()
                .update_channel(self.target(), channel, &config_tx),
        )
        .await
    }

    pub async fn join_channel(&self, channel: &str, org: &str) -> Result<(), WorkflowError> {
        info!(channel, org, "joining channel");
        self.bounded(
            format!("join '{org}' to channel '{channel}'"),
            self.ctx().admin().join_channel(self.target(), channel, org),
        )
        .await
    }

    /// Creates every profile channel and joins each organization owning one
    /// of its peers.
    pub async fn create_and_join_all_channels(&self) -> Result<Vec<String>, WorkflowError> {
        let channels = self.target().profile.channel_names();
        self.create_and_join(&channels).await?;
        Ok(channels)
    }

    /// Like [`Self::create_and_join_all_channels`] but skips channels the
    /// network already reports as joined.
    pub async fn create_and_join_missing_channels(&self) -> Result<Vec<String>, WorkflowError> {
        let joined = self
            .bounded(
                "list existing channels",
                self.ctx().admin().existing_channels(self.target()),
            )
            .await?;

        let missing = self
            .target()
            .profile
            .channel_names()
            .into_iter()
            .filter(|channel| !joined.contains(channel))
            .inspect(|channel| info!(%channel, "adding channel to list of channels to be created"))
            .collect::<Vec<_>>();

        self.create_and_join(&missing).await?;
        Ok(missing)
    }

    /// Creates a version-two capabilities channel from its own channel
    /// transaction and joins the first two connected organizations.
    pub async fn create_and_join_v2_channel(
        &self,
        channel: &str,
        connected: &[String],
    ) -> Result<(), WorkflowError> {
        let [first, second, ..] = connected else {
            return Err(WorkflowError::MissingClients {
                needed: 2,
                connected: connected.len(),
            });
        };

        let config_root = self.ctx().fixtures().v2_channel_config_root();
        info!(channel, config_root = %config_root.display(), "creating v2 capabilities channel");
        self.bounded(
            format!("create v2 channel '{channel}'"),
            self.ctx()
                .admin()
                .create_channel(self.target(), channel, &config_root),
        )
        .await?;

        self.join_channel(channel, first).await?;
        self.join_channel(channel, second).await
    }

    /// Opens an admin client for every organization in the profile.
    pub async fn connect_organizations(&self) -> Result<Vec<String>, WorkflowError> {
        let orgs = self.target().profile.organization_names();
        for org in &orgs {
            self.bounded(
                format!("connect client for '{org}'"),
                self.ctx().admin().connect_organization(self.target(), org),
            )
            .await?;
        }
        Ok(orgs)
    }

    async fn create_and_join(&self, channels: &[String]) -> Result<(), WorkflowError> {
        for channel in channels {
            self.create_channel(channel).await?;
            for org in self.target().profile.organizations_for_channel(channel)? {
                self.join_channel(channel, &org).await?;
            }
        }
        Ok(())
    }
}
