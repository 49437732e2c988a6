//! Main application state and update loop

use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui;

use stablepay_wallet_adapters::{CustodyAdapterConfig, CustodyServiceAdapter};
use stablepay_wallet_core::{
    CommandOutcome, PendingAction, TransferMode, WalletCommand, WalletFlowState, WalletState,
    WorkflowProfile,
};

use crate::state::{NoticeTimer, WalletForms};
use crate::ui;
use crate::wallet_bridge::{Repaint, WalletBridge};

/// The main application state
pub struct App {
    bridge: WalletBridge,
    forms: WalletForms,
    notice_timer: NoticeTimer,
}

impl App {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        service: CustodyServiceAdapter,
        profile: WorkflowProfile,
        config: &CustodyAdapterConfig,
    ) -> Self {
        let ctx = cc.egui_ctx.clone();
        let repaint: Repaint = Arc::new(move || ctx.request_repaint());
        let forms = WalletForms::new(&profile);
        let bridge = WalletBridge::new(service, profile, config.balance_poll_interval(), repaint);

        let mut app = Self {
            bridge,
            forms,
            notice_timer: NoticeTimer::default(),
        };
        app.submit(WalletCommand::LoadCustomers);
        app
    }

    fn submit(&mut self, command: WalletCommand) {
        match self.bridge.submit(command) {
            Ok(Some(outcome)) => self.apply_outcome(outcome),
            Ok(None) => {}
            // Already on screen as the current notice.
            Err(err) => tracing::debug!(error = %err, "command rejected"),
        }
    }

    fn apply_outcome(&mut self, outcome: CommandOutcome) {
        match outcome {
            CommandOutcome::WalletCreated { address } => {
                self.forms.wallet_changed(self.bridge.profile(), &address);
            }
            CommandOutcome::Deposited { .. } => self.forms.deposit_amount.clear(),
            CommandOutcome::Transferred { .. } => self.forms.transfer_amount.clear(),
            CommandOutcome::CustomersLoaded(customers) => self.forms.customers = customers,
            CommandOutcome::Approved { .. }
            | CommandOutcome::BalanceRefreshed(_)
            | CommandOutcome::Discarded => {}
        }
    }

    fn logout(&mut self) {
        self.bridge.logout();
        self.forms.logged_out(self.bridge.profile());
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        for outcome in self.bridge.pump().into_iter().flatten() {
            self.apply_outcome(outcome);
        }

        let now = Instant::now();
        if self
            .notice_timer
            .expired(self.bridge.state().notice.as_ref(), now)
        {
            self.bridge.dismiss_notice();
        }
        let state = self.bridge.state();
        if state.notice.is_some() || !state.pending.is_empty() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        let title = self.bridge.profile().title.clone();
        let tagline = self.bridge.profile().tagline.clone();
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            ui::styled_heading(ui, &format!("💱 {title}"));
            ui.label(egui::RichText::new(tagline).weak());
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(10.0);
                if let Some(notice) = self.bridge.state().notice.clone() {
                    if ui::notice_banner(ui, &notice) {
                        self.bridge.dismiss_notice();
                    }
                    ui.add_space(6.0);
                }

                // Snapshot so the sections can mutate the bridge while rendering.
                let state = self.bridge.state().clone();
                self.render_wallet_section(ui, &state);
                self.render_deposit_section(ui, &state);
                self.render_approve_section(ui, &state);
                self.render_transfer_section(ui, &state);
                ui.add_space(20.0);
            });
        });
    }
}

impl App {
    fn render_wallet_section(&mut self, ui: &mut egui::Ui, state: &WalletState) {
        ui::section_header(ui, "1. Wallet");

        let Some(session) = &state.session else {
            self.render_wallet_form(ui, state);
            return;
        };

        let coin = self.bridge.profile().default_coin;
        let refreshing = state.is_pending(PendingAction::RefreshingBalance);
        let mut refresh = false;
        let mut logout = false;
        ui::card(ui, |ui| {
            if ui::labeled_field_with_copy(ui, "Address", &session.address) {
                ui::copy_to_clipboard(&session.address);
            }
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("User:").strong());
                ui.label(session.identifier.as_str());
                if session.has_private_key() {
                    ui.label(egui::RichText::new("🔑 owner key held").weak())
                        .on_hover_text("Used only to authorize approvals");
                }
            });
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Balance:").strong());
                ui.label(
                    egui::RichText::new(format!("{} {}", state.balance, coin))
                        .monospace()
                        .size(16.0),
                );
                if refreshing {
                    ui.spinner();
                } else if ui.small_button("⟳").on_hover_text("Refresh balance").clicked() {
                    refresh = true;
                }
            });
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Step:").strong());
                ui.label(flow_label(state.flow));
                if self.bridge.is_polling() {
                    ui.label(egui::RichText::new("(auto-refresh on)").weak().small());
                }
            });
            ui.add_space(6.0);
            logout = ui::secondary_button(ui, "Log out", true).clicked();
        });

        if refresh {
            self.submit(WalletCommand::RefreshBalance);
        }
        if logout {
            self.logout();
        }
    }

    fn render_wallet_form(&mut self, ui: &mut egui::Ui, state: &WalletState) {
        let creating = state.is_pending(PendingAction::CreatingWallet);
        let loading_customers = state.is_pending(PendingAction::LoadingCustomers);
        let mut create = false;
        let mut resume = false;
        let mut reload = false;

        ui::card(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label("Customer:");
                let selected = if self.forms.email.is_empty() {
                    "Select a customer".to_owned()
                } else {
                    self.forms.email.clone()
                };
                let mut picked = None;
                egui::ComboBox::from_id_salt("customer_select")
                    .selected_text(selected)
                    .width(260.0)
                    .show_ui(ui, |ui| {
                        for customer in &self.forms.customers {
                            let label = match &customer.name {
                                Some(name) => format!("{name} ({})", customer.email),
                                None => customer.email.clone(),
                            };
                            let is_selected = self.forms.email == customer.email;
                            if ui.selectable_label(is_selected, label).clicked() {
                                picked = Some(customer.email.clone());
                            }
                        }
                    });
                if let Some(email) = picked {
                    self.forms.email = email;
                }
                if loading_customers {
                    ui.spinner();
                } else if ui.small_button("⟳").on_hover_text("Reload customers").clicked() {
                    reload = true;
                }
            });
            ui.horizontal(|ui| {
                ui.label("Email:");
                ui.add(
                    egui::TextEdit::singleline(&mut self.forms.email)
                        .hint_text("you@example.com")
                        .desired_width(260.0),
                );
            });
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                let busy = creating.then(|| PendingAction::CreatingWallet.label());
                create = ui::primary_button(ui, "Create wallet", busy, true);
                if !creating {
                    resume = ui::secondary_button(ui, "Load existing", true)
                        .on_hover_text("Look up the wallet already issued to this email")
                        .clicked();
                }
            });
        });

        if reload {
            self.submit(WalletCommand::LoadCustomers);
        }
        if create {
            self.submit(WalletCommand::CreateWallet {
                identifier: self.forms.email.clone(),
            });
        }
        if resume {
            self.submit(WalletCommand::ResumeWallet {
                identifier: self.forms.email.clone(),
            });
        }
    }

    fn render_deposit_section(&mut self, ui: &mut egui::Ui, state: &WalletState) {
        ui::section_header(ui, "2. Deposit");
        let coins = self.bridge.profile().coin_types.clone();
        let busy = state
            .is_pending(PendingAction::Depositing)
            .then(|| PendingAction::Depositing.label());
        let mut deposit = false;

        ui.add_enabled_ui(state.has_session(), |ui| {
            ui.horizontal(|ui| {
                ui.label("Amount:");
                ui::amount_input(ui, &mut self.forms.deposit_amount);
                ui::coin_picker(ui, "deposit_coin", &mut self.forms.deposit_coin, &coins);
                deposit = ui::primary_button(ui, "Deposit", busy, true);
            });
        });

        if deposit {
            self.submit(WalletCommand::Deposit {
                amount: self.forms.deposit_amount.clone(),
                coin_type: self.forms.deposit_coin,
            });
        }
    }

    fn render_approve_section(&mut self, ui: &mut egui::Ui, state: &WalletState) {
        ui::section_header(ui, "3. Approve");
        let coins = self.bridge.profile().coin_types.clone();
        let busy = state
            .is_pending(PendingAction::Approving)
            .then(|| PendingAction::Approving.label());
        let mut owner_changed = false;
        let mut amount_changed = false;
        let mut approve = false;

        ui.add_enabled_ui(state.has_session(), |ui| {
            ui.horizontal(|ui| {
                ui.label("Owner address:");
                owner_changed = ui::address_input(ui, &mut self.forms.owner_address).changed();
            });
            ui.horizontal(|ui| {
                ui.label("Amount:");
                amount_changed = ui::amount_input(ui, &mut self.forms.approve_amount).changed();
                ui::coin_picker(ui, "approve_coin", &mut self.forms.approve_coin, &coins);
                approve = ui::primary_button(ui, "Approve", busy, true);
            });
            match state.allowance {
                Some(allowance) => ui.label(format!(
                    "Approved: {} {}",
                    allowance.amount, allowance.coin_type
                )),
                None => ui.label(egui::RichText::new("No active approval").weak()),
            };
        });

        if owner_changed {
            self.bridge.set_owner_address(&self.forms.owner_address);
        }
        if amount_changed {
            self.bridge.approve_amount_changed();
        }
        if approve {
            self.submit(WalletCommand::Approve {
                amount: self.forms.approve_amount.clone(),
                coin_type: self.forms.approve_coin,
            });
        }
    }

    fn render_transfer_section(&mut self, ui: &mut egui::Ui, state: &WalletState) {
        ui::section_header(ui, "4. Transfer");
        let profile = self.bridge.profile().clone();
        let busy = state
            .is_pending(PendingAction::Transferring)
            .then(|| PendingAction::Transferring.label());
        let mut transfer = false;

        ui.add_enabled_ui(state.allowance.is_some(), |ui| {
            ui.horizontal(|ui| {
                ui.label("Target:");
                if profile.custodial_targets.is_empty() {
                    ui::address_input(ui, &mut self.forms.target_address);
                } else {
                    egui::ComboBox::from_id_salt("target_select")
                        .selected_text(self.forms.target_address.clone())
                        .width(320.0)
                        .show_ui(ui, |ui| {
                            for target in &profile.custodial_targets {
                                ui.selectable_value(
                                    &mut self.forms.target_address,
                                    target.clone(),
                                    target.as_str(),
                                );
                            }
                        });
                }
            });
            ui.horizontal(|ui| {
                ui.label("Amount:");
                ui::amount_input(ui, &mut self.forms.transfer_amount);
                ui::coin_picker(
                    ui,
                    "transfer_coin",
                    &mut self.forms.transfer_coin,
                    &profile.coin_types,
                );
                transfer = ui::primary_button(ui, "Transfer", busy, true);
            });
            if let Some(allowance) = state.allowance {
                ui.label(
                    egui::RichText::new(format!(
                        "Up to {} {}",
                        allowance.amount, allowance.coin_type
                    ))
                    .weak(),
                );
            }
            if profile.transfer_mode == TransferMode::Simulated {
                ui.label(
                    egui::RichText::new("Simulated transfer: only the local balance changes.")
                        .weak()
                        .small(),
                );
            }
        });

        if transfer {
            self.submit(WalletCommand::Transfer {
                target_address: self.forms.target_address.clone(),
                amount: self.forms.transfer_amount.clone(),
                coin_type: self.forms.transfer_coin,
            });
        }
    }
}

fn flow_label(flow: WalletFlowState) -> &'static str {
    match flow {
        WalletFlowState::Uninitialized => "No wallet",
        WalletFlowState::Created => "Created, waiting for a deposit",
        WalletFlowState::Funded => "Funded, ready to approve",
        WalletFlowState::Approved => "Approved, ready to transfer",
    }
}
